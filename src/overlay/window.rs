use crate::overlay::layout::{PanelGeometry, TextAlign};
use crate::settings::OverlaySettings;
use anyhow::Result;
use std::sync::Arc;

/// Platform panel driven by the owner thread.
///
/// A surface is created on the owner thread and never leaves it, so
/// implementations are free to hold thread-affine window handles.
pub trait OverlaySurface {
    fn screen_size(&self) -> (i32, i32);
    fn set_geometry(&mut self, geometry: PanelGeometry) -> Result<()>;
    fn set_opacity(&mut self, opacity: f32) -> Result<()>;
    fn set_text(&mut self, text: &str, align: TextAlign) -> Result<()>;
    fn raise(&mut self) -> Result<()>;
    fn set_visible(&mut self, visible: bool) -> Result<()>;
    /// One step of the presentation loop.
    fn pump(&mut self) {}
    fn shutdown(&mut self) {}
}

pub type SurfaceFactory =
    Arc<dyn Fn(&OverlaySettings) -> Result<Box<dyn OverlaySurface>> + Send + Sync>;

/// Surface that keeps panel state in memory without drawing anything.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HeadlessSurface {
    pub screen: (i32, i32),
    pub geometry: PanelGeometry,
    pub text: String,
    pub align: TextAlign,
    pub opacity: f32,
    pub visible: bool,
    pub raise_count: u64,
}

impl HeadlessSurface {
    pub fn new(screen: (i32, i32)) -> Self {
        Self {
            screen,
            ..Self::default()
        }
    }
}

impl OverlaySurface for HeadlessSurface {
    fn screen_size(&self) -> (i32, i32) {
        self.screen
    }

    fn set_geometry(&mut self, geometry: PanelGeometry) -> Result<()> {
        self.geometry = geometry;
        Ok(())
    }

    fn set_opacity(&mut self, opacity: f32) -> Result<()> {
        self.opacity = opacity;
        Ok(())
    }

    fn set_text(&mut self, text: &str, align: TextAlign) -> Result<()> {
        self.text = text.to_string();
        self.align = align;
        Ok(())
    }

    fn raise(&mut self) -> Result<()> {
        self.raise_count += 1;
        Ok(())
    }

    fn set_visible(&mut self, visible: bool) -> Result<()> {
        self.visible = visible;
        Ok(())
    }
}

pub fn headless_surface_factory() -> SurfaceFactory {
    Arc::new(
        |settings: &OverlaySettings| -> Result<Box<dyn OverlaySurface>> {
            Ok(Box::new(HeadlessSurface::new(settings.headless_screen)))
        },
    )
}

/// Factory for the platform window, falling back to a headless surface
/// where no native backend exists.
pub fn native_surface_factory() -> SurfaceFactory {
    #[cfg(windows)]
    {
        Arc::new(
            |settings: &OverlaySettings| -> Result<Box<dyn OverlaySurface>> {
                Ok(Box::new(platform::LayeredPanel::create(settings)?))
            },
        )
    }

    #[cfg(not(windows))]
    {
        tracing::debug!("no native overlay backend on this platform; using headless surface");
        headless_surface_factory()
    }
}

#[cfg(windows)]
mod platform {
    use super::OverlaySurface;
    use crate::overlay::layout::{PanelGeometry, TextAlign};
    use crate::settings::{opacity_to_alpha, OverlaySettings};
    use anyhow::{bail, Context, Result};
    use std::sync::Once;
    use windows::core::{w, PCWSTR};
    use windows::Win32::Foundation::{COLORREF, HWND, LPARAM, LRESULT, RECT, WPARAM};
    use windows::Win32::Graphics::Gdi::{
        BeginPaint, CreateFontIndirectW, DeleteObject, DrawTextW, EndPaint, FillRect,
        GetStockObject, InvalidateRect, SelectObject, SetBkMode, SetTextColor, BLACK_BRUSH,
        DEFAULT_GUI_FONT, DT_CENTER, DT_LEFT, DT_NOPREFIX, DT_WORDBREAK, HBRUSH, HFONT, HGDIOBJ,
        LOGFONTW, PAINTSTRUCT, TRANSPARENT,
    };
    use windows::Win32::System::LibraryLoader::GetModuleHandleW;
    use windows::Win32::UI::WindowsAndMessaging::{
        CreateWindowExW, DefWindowProcW, DestroyWindow, DispatchMessageW, GetClientRect,
        GetSystemMetrics, GetWindowLongPtrW, PeekMessageW, RegisterClassW,
        SetLayeredWindowAttributes, SetWindowLongPtrW, SetWindowPos, ShowWindow,
        TranslateMessage, GWLP_USERDATA, HWND_TOPMOST, LWA_ALPHA, MSG, PM_REMOVE, SM_CXSCREEN,
        SM_CYSCREEN, SWP_NOACTIVATE, SWP_NOMOVE, SWP_NOSIZE, SW_HIDE, SW_SHOWNOACTIVATE,
        WINDOW_EX_STYLE, WM_ERASEBKGND, WM_PAINT, WNDCLASSW, WS_EX_LAYERED, WS_EX_NOACTIVATE,
        WS_EX_TOOLWINDOW, WS_EX_TOPMOST, WS_EX_TRANSPARENT, WS_POPUP,
    };

    const TEXT_INSET: i32 = 5;
    const FONT_FACE: &str = "Segoe UI";
    const FONT_WEIGHT_NORMAL: i32 = 400;

    struct PaintState {
        text: Vec<u16>,
        align: TextAlign,
        wrap_width: i32,
        font: HFONT,
    }

    /// Null when GDI refuses the font; painting then uses the stock GUI font.
    fn create_panel_font(font_size: i32) -> HFONT {
        let mut logfont = LOGFONTW {
            // Negative height selects by character height in pixels.
            lfHeight: -font_size.max(1),
            lfWeight: FONT_WEIGHT_NORMAL,
            ..Default::default()
        };
        for (slot, unit) in logfont.lfFaceName.iter_mut().zip(FONT_FACE.encode_utf16()) {
            *slot = unit;
        }
        unsafe { CreateFontIndirectW(&logfont) }
    }

    /// Click-through so the agent's own pointer input is never intercepted.
    pub fn compose_panel_ex_style() -> WINDOW_EX_STYLE {
        WS_EX_LAYERED | WS_EX_TOPMOST | WS_EX_TOOLWINDOW | WS_EX_NOACTIVATE | WS_EX_TRANSPARENT
    }

    unsafe extern "system" fn panel_wndproc(
        hwnd: HWND,
        msg: u32,
        wparam: WPARAM,
        lparam: LPARAM,
    ) -> LRESULT {
        match msg {
            WM_ERASEBKGND => LRESULT(1),
            WM_PAINT => {
                let mut ps = PAINTSTRUCT::default();
                let hdc = unsafe { BeginPaint(hwnd, &mut ps) };
                let mut client = RECT::default();
                unsafe {
                    let _ = GetClientRect(hwnd, &mut client);
                    FillRect(hdc, &client, HBRUSH(GetStockObject(BLACK_BRUSH).0));
                }
                let state =
                    unsafe { (GetWindowLongPtrW(hwnd, GWLP_USERDATA) as *const PaintState).as_ref() };
                if let Some(state) = state {
                    let mut text = state.text.clone();
                    let right = (client.left + TEXT_INSET + state.wrap_width)
                        .min(client.right - TEXT_INSET);
                    let mut text_rect = RECT {
                        left: client.left + TEXT_INSET,
                        top: client.top + TEXT_INSET,
                        right,
                        bottom: client.bottom - TEXT_INSET,
                    };
                    let align = match state.align {
                        TextAlign::Center => DT_CENTER,
                        TextAlign::Left => DT_LEFT,
                    };
                    let font = if state.font.0.is_null() {
                        unsafe { GetStockObject(DEFAULT_GUI_FONT) }
                    } else {
                        HGDIOBJ(state.font.0)
                    };
                    unsafe {
                        SelectObject(hdc, font);
                        SetBkMode(hdc, TRANSPARENT);
                        SetTextColor(hdc, COLORREF(0x00ffffff));
                        DrawTextW(
                            hdc,
                            &mut text,
                            &mut text_rect,
                            align | DT_WORDBREAK | DT_NOPREFIX,
                        );
                    }
                }
                unsafe {
                    let _ = EndPaint(hwnd, &ps);
                }
                LRESULT(0)
            }
            _ => unsafe { DefWindowProcW(hwnd, msg, wparam, lparam) },
        }
    }

    pub struct LayeredPanel {
        hwnd: HWND,
        paint: Box<PaintState>,
        screen: (i32, i32),
    }

    impl LayeredPanel {
        pub fn create(settings: &OverlaySettings) -> Result<Self> {
            static REGISTER_CLASS: Once = Once::new();
            let class_name = w!("ActionOverlayPanel");
            let hinstance =
                unsafe { GetModuleHandleW(PCWSTR::null()) }.context("module handle unavailable")?;

            REGISTER_CLASS.call_once(|| unsafe {
                let wc = WNDCLASSW {
                    hInstance: hinstance.into(),
                    lpszClassName: class_name,
                    lpfnWndProc: Some(panel_wndproc),
                    ..Default::default()
                };
                let _ = RegisterClassW(&wc);
            });

            let screen = unsafe { (GetSystemMetrics(SM_CXSCREEN), GetSystemMetrics(SM_CYSCREEN)) };
            if screen.0 <= 0 || screen.1 <= 0 {
                bail!("no primary display reported");
            }

            let hwnd = unsafe {
                CreateWindowExW(
                    compose_panel_ex_style(),
                    class_name,
                    PCWSTR::null(),
                    WS_POPUP,
                    (screen.0 - settings.width) / 2,
                    settings.top_offset,
                    settings.width,
                    settings.min_height,
                    None,
                    None,
                    hinstance,
                    None,
                )
            }
            .context("failed to create overlay window")?;

            let mut panel = Self {
                hwnd,
                paint: Box::new(PaintState {
                    text: Vec::new(),
                    align: TextAlign::Center,
                    wrap_width: settings.wrap_width,
                    font: create_panel_font(settings.font_size),
                }),
                screen,
            };
            unsafe {
                SetWindowLongPtrW(
                    hwnd,
                    GWLP_USERDATA,
                    &*panel.paint as *const PaintState as isize,
                );
            }
            if let Err(err) = panel.set_opacity(settings.opacity) {
                panel.shutdown();
                return Err(err);
            }
            Ok(panel)
        }
    }

    impl OverlaySurface for LayeredPanel {
        fn screen_size(&self) -> (i32, i32) {
            self.screen
        }

        fn set_geometry(&mut self, geometry: PanelGeometry) -> Result<()> {
            unsafe {
                SetWindowPos(
                    self.hwnd,
                    HWND_TOPMOST,
                    geometry.x,
                    geometry.y,
                    geometry.width,
                    geometry.height,
                    SWP_NOACTIVATE,
                )
            }
            .context("failed to move overlay window")
        }

        fn set_opacity(&mut self, opacity: f32) -> Result<()> {
            let alpha = opacity_to_alpha(opacity);
            unsafe { SetLayeredWindowAttributes(self.hwnd, COLORREF(0), alpha, LWA_ALPHA) }
                .context("failed to set overlay opacity")
        }

        fn set_text(&mut self, text: &str, align: TextAlign) -> Result<()> {
            self.paint.text = text.encode_utf16().collect();
            self.paint.align = align;
            unsafe {
                let _ = InvalidateRect(self.hwnd, None, true);
            }
            Ok(())
        }

        fn raise(&mut self) -> Result<()> {
            unsafe {
                SetWindowPos(
                    self.hwnd,
                    HWND_TOPMOST,
                    0,
                    0,
                    0,
                    0,
                    SWP_NOMOVE | SWP_NOSIZE | SWP_NOACTIVATE,
                )
            }
            .context("failed to raise overlay window")
        }

        fn set_visible(&mut self, visible: bool) -> Result<()> {
            let command = if visible { SW_SHOWNOACTIVATE } else { SW_HIDE };
            unsafe {
                let _ = ShowWindow(self.hwnd, command);
            }
            Ok(())
        }

        fn pump(&mut self) {
            unsafe {
                let mut msg = MSG::default();
                while PeekMessageW(&mut msg, HWND::default(), 0, 0, PM_REMOVE).into() {
                    let _ = TranslateMessage(&msg);
                    DispatchMessageW(&msg);
                }
            }
        }

        fn shutdown(&mut self) {
            if !self.hwnd.0.is_null() {
                unsafe {
                    SetWindowLongPtrW(self.hwnd, GWLP_USERDATA, 0);
                    let _ = DestroyWindow(self.hwnd);
                }
                self.hwnd = HWND::default();
            }
            if !self.paint.font.0.is_null() {
                unsafe {
                    let _ = DeleteObject(HGDIOBJ(self.paint.font.0));
                }
                self.paint.font = HFONT::default();
            }
        }
    }

    impl Drop for LayeredPanel {
        fn drop(&mut self) {
            self.shutdown();
        }
    }

    #[cfg(test)]
    mod windows_tests {
        use super::{compose_panel_ex_style, create_panel_font};
        use windows::Win32::Graphics::Gdi::{DeleteObject, HGDIOBJ};
        use windows::Win32::UI::WindowsAndMessaging::{
            WS_EX_LAYERED, WS_EX_NOACTIVATE, WS_EX_TOPMOST, WS_EX_TRANSPARENT,
        };

        #[test]
        fn panel_is_topmost_layered_and_click_through() {
            let style = compose_panel_ex_style();
            assert_ne!(style.0 & WS_EX_LAYERED.0, 0);
            assert_ne!(style.0 & WS_EX_TOPMOST.0, 0);
            assert_ne!(style.0 & WS_EX_NOACTIVATE.0, 0);
            assert_ne!(style.0 & WS_EX_TRANSPARENT.0, 0);
        }

        #[test]
        fn panel_font_is_created_from_configured_size() {
            let font = create_panel_font(16);
            assert!(!font.0.is_null());
            unsafe {
                let _ = DeleteObject(HGDIOBJ(font.0));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headless_factory_uses_configured_screen() {
        let settings = OverlaySettings {
            headless_screen: (1280, 720),
            ..OverlaySettings::default()
        };
        let surface = headless_surface_factory()(&settings).expect("headless surface");
        assert_eq!(surface.screen_size(), (1280, 720));
    }

    #[test]
    fn headless_surface_records_panel_state() {
        let mut surface = HeadlessSurface::new((800, 600));
        surface.set_text("click", TextAlign::Center).expect("text");
        surface.set_visible(true).expect("visible");
        surface.raise().expect("raise");
        assert_eq!(surface.text, "click");
        assert!(surface.visible);
        assert_eq!(surface.raise_count, 1);
    }
}
