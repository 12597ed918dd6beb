//! Device sessions and the document/page state machine.
//!
//! ```text
//! Idle -> DocumentStarted -> { PageStarted -> DocumentStarted }* -> Idle
//! ```
//!
//! Scoped helpers ([`with_session`], [`DeviceSession::document`],
//! [`Document::page`]) guarantee the matching end call fires on every exit
//! path, so a failure never leaves the printer inside a half-open job.

use crate::bitmap::Bitmap;
use crate::device::PrintDevice;
use crate::error::{PrintError, Result};
use crate::fit::{fit_to_paper, FitRect};
use tracing::{debug, warn};

/// Where a session is in the document/page lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    DocumentStarted,
    PageStarted,
}

impl SessionState {
    fn describe(self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::DocumentStarted => "a document is open",
            SessionState::PageStarted => "a page is open",
        }
    }
}

/// Combine a body result with the result of releasing its resource.
/// The body's error wins; a release error only surfaces on success.
fn finish<T>(body: Result<T>, release: Result<()>) -> Result<T> {
    match (body, release) {
        (Ok(value), Ok(())) => Ok(value),
        (Ok(_), Err(e)) => Err(e),
        (Err(e), Ok(())) => Err(e),
        (Err(e), Err(release_err)) => {
            warn!("Release failed after error ({}): {}", e, release_err);
            Err(e)
        }
    }
}

/// Open a session on `device`, run `f`, and close the device exactly once.
pub fn with_session<T, F>(device: Box<dyn PrintDevice>, f: F) -> Result<T>
where
    F: FnOnce(&mut DeviceSession) -> Result<T>,
{
    let mut session = DeviceSession::new(device);
    let result = f(&mut session);
    let closed = session.close();
    finish(result, closed)
}

/// Exclusive connection to one printer.
pub struct DeviceSession {
    device: Box<dyn PrintDevice>,
    state: SessionState,
    closed: bool,
}

impl DeviceSession {
    pub fn new(device: Box<dyn PrintDevice>) -> Self {
        debug!("Session opened on {:?}", device.name());
        Self {
            device,
            state: SessionState::Idle,
            closed: false,
        }
    }

    pub fn printer_name(&self) -> &str {
        self.device.name()
    }

    pub fn paper_size(&self) -> (u32, u32) {
        self.device.paper_size()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    fn require(&self, state: SessionState, operation: &'static str) -> Result<()> {
        if self.closed {
            return Err(PrintError::InvalidState {
                operation,
                state: "the session is closed",
            });
        }
        if self.state != state {
            return Err(PrintError::InvalidState {
                operation,
                state: self.state.describe(),
            });
        }
        Ok(())
    }

    pub fn start_document(&mut self, name: &str) -> Result<()> {
        self.require(SessionState::Idle, "start a document")?;
        self.device.start_document(name)?;
        self.state = SessionState::DocumentStarted;
        Ok(())
    }

    pub fn start_page(&mut self) -> Result<()> {
        self.require(SessionState::DocumentStarted, "start a page")?;
        self.device.start_page()?;
        self.state = SessionState::PageStarted;
        Ok(())
    }

    pub fn draw_bitmap(&mut self, bitmap: &Bitmap, rect: FitRect) -> Result<()> {
        self.require(SessionState::PageStarted, "draw")?;
        self.device.draw_bitmap(bitmap, rect)
    }

    pub fn end_page(&mut self) -> Result<()> {
        self.require(SessionState::PageStarted, "end a page")?;
        // The page is over even if the device complains.
        self.state = SessionState::DocumentStarted;
        self.device.end_page()
    }

    pub fn end_document(&mut self) -> Result<()> {
        self.require(SessionState::DocumentStarted, "end a document")?;
        self.state = SessionState::Idle;
        self.device.end_document()
    }

    /// Run `f` inside a document named `name`; the document is always ended.
    pub fn document<T, F>(&mut self, name: &str, f: F) -> Result<T>
    where
        F: FnOnce(&mut Document<'_>) -> Result<T>,
    {
        self.start_document(name)?;
        let result = {
            let mut document = Document {
                session: &mut *self,
            };
            f(&mut document)
        };
        let ended = self.end_document();
        finish(result, ended)
    }

    /// Release the device. Idempotent; any open page or document is ended
    /// first.
    pub fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        let mut unwound = Ok(());
        if self.state == SessionState::PageStarted {
            unwound = self.end_page();
        }
        if self.state == SessionState::DocumentStarted {
            unwound = finish(unwound, self.end_document());
        }
        self.closed = true;
        let closed = self.device.close();
        debug!("Session closed on {:?}", self.device.name());
        finish(unwound, closed)
    }
}

impl Drop for DeviceSession {
    fn drop(&mut self) {
        if !self.closed {
            if let Err(e) = self.close() {
                warn!("Closing {:?} on drop failed: {}", self.device.name(), e);
            }
        }
    }
}

/// An open document on a session.
pub struct Document<'s> {
    session: &'s mut DeviceSession,
}

impl<'s> Document<'s> {
    pub fn paper_size(&self) -> (u32, u32) {
        self.session.paper_size()
    }

    /// Run `f` inside a new page; the page is always ended.
    pub fn page<T, F>(&mut self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Page<'_>) -> Result<T>,
    {
        self.session.start_page()?;
        let result = {
            let mut page = Page {
                session: &mut *self.session,
            };
            f(&mut page)
        };
        let ended = self.session.end_page();
        finish(result, ended)
    }

    /// Print one bitmap on its own page, fitted to the paper.
    pub fn print_bitmap(&mut self, bitmap: &Bitmap) -> Result<FitRect> {
        self.page(|page| page.draw(bitmap))
    }
}

/// An open page on a document.
pub struct Page<'s> {
    session: &'s mut DeviceSession,
}

impl<'s> Page<'s> {
    /// Draw `bitmap` as large as possible, centered on the paper.
    pub fn draw(&mut self, bitmap: &Bitmap) -> Result<FitRect> {
        let rect = fit_to_paper(bitmap.size(), self.session.paper_size());
        self.session.draw_bitmap(bitmap, rect)?;
        Ok(rect)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;
    use std::cell::RefCell;
    use std::rc::Rc;

    type Log = Rc<RefCell<Vec<String>>>;

    struct FakeDevice {
        log: Log,
        fail_draw_on: Option<usize>,
        draws: usize,
    }

    impl FakeDevice {
        fn boxed(log: &Log) -> Box<dyn PrintDevice> {
            Box::new(FakeDevice {
                log: log.clone(),
                fail_draw_on: None,
                draws: 0,
            })
        }
    }

    impl PrintDevice for FakeDevice {
        fn name(&self) -> &str {
            "fake"
        }
        fn paper_size(&self) -> (u32, u32) {
            (100, 200)
        }
        fn start_document(&mut self, name: &str) -> Result<()> {
            self.log.borrow_mut().push(format!("start_doc {}", name));
            Ok(())
        }
        fn start_page(&mut self) -> Result<()> {
            self.log.borrow_mut().push("start_page".into());
            Ok(())
        }
        fn draw_bitmap(&mut self, _: &Bitmap, rect: FitRect) -> Result<()> {
            self.draws += 1;
            if Some(self.draws) == self.fail_draw_on {
                return Err(PrintError::device("fake", "paper jam"));
            }
            self.log.borrow_mut().push(format!(
                "draw {},{},{},{}",
                rect.x1, rect.y1, rect.x2, rect.y2
            ));
            Ok(())
        }
        fn end_page(&mut self) -> Result<()> {
            self.log.borrow_mut().push("end_page".into());
            Ok(())
        }
        fn end_document(&mut self) -> Result<()> {
            self.log.borrow_mut().push("end_doc".into());
            Ok(())
        }
        fn close(&mut self) -> Result<()> {
            self.log.borrow_mut().push("close".into());
            Ok(())
        }
    }

    fn bitmap() -> Bitmap {
        Bitmap::from_rgb(RgbImage::new(10, 10))
    }

    #[test]
    fn test_document_with_pages_nests_strictly() {
        let log = Log::default();
        with_session(FakeDevice::boxed(&log), |session| {
            session.document("a.pdf", |doc| {
                doc.print_bitmap(&bitmap())?;
                doc.print_bitmap(&bitmap())?;
                Ok(())
            })
        })
        .unwrap();

        assert_eq!(
            *log.borrow(),
            vec![
                "start_doc a.pdf",
                "start_page",
                "draw 0,50,100,150",
                "end_page",
                "start_page",
                "draw 0,50,100,150",
                "end_page",
                "end_doc",
                "close"
            ]
        );
    }

    #[test]
    fn test_failure_on_second_page_still_ends_page_and_document() {
        let log = Log::default();
        let device = Box::new(FakeDevice {
            log: log.clone(),
            fail_draw_on: Some(2),
            draws: 0,
        });
        let result = with_session(device, |session| {
            session.document("b.pdf", |doc| {
                for _ in 0..3 {
                    doc.print_bitmap(&bitmap())?;
                }
                Ok(())
            })
        });

        assert!(matches!(result, Err(PrintError::Device { .. })));
        assert_eq!(
            *log.borrow(),
            vec![
                "start_doc b.pdf",
                "start_page",
                "draw 0,50,100,150",
                "end_page",
                "start_page",
                "end_page",
                "end_doc",
                "close"
            ]
        );
    }

    #[test]
    fn test_second_document_while_open_is_rejected() {
        let log = Log::default();
        let mut session = DeviceSession::new(FakeDevice::boxed(&log));
        session.start_document("one").unwrap();
        let err = session.start_document("two").unwrap_err();
        assert!(matches!(
            err,
            PrintError::InvalidState {
                operation: "start a document",
                ..
            }
        ));
        assert_eq!(session.state(), SessionState::DocumentStarted);
        session.end_document().unwrap();
        session.close().unwrap();
    }

    #[test]
    fn test_draw_outside_page_is_rejected() {
        let log = Log::default();
        let mut session = DeviceSession::new(FakeDevice::boxed(&log));
        let rect = FitRect { x1: 0, y1: 0, x2: 1, y2: 1 };
        assert!(session.draw_bitmap(&bitmap(), rect).is_err());
        session.start_document("d").unwrap();
        assert!(session.draw_bitmap(&bitmap(), rect).is_err());
        session.close().unwrap();
        assert!(!log.borrow().iter().any(|l| l.starts_with("draw")));
    }

    #[test]
    fn test_close_unwinds_open_page_and_document() {
        let log = Log::default();
        let mut session = DeviceSession::new(FakeDevice::boxed(&log));
        session.start_document("d").unwrap();
        session.start_page().unwrap();
        session.close().unwrap();
        session.close().unwrap();
        assert_eq!(
            *log.borrow(),
            vec!["start_doc d", "start_page", "end_page", "end_doc", "close"]
        );
    }

    #[test]
    fn test_session_closes_on_body_error() {
        let log = Log::default();
        let result: Result<()> = with_session(FakeDevice::boxed(&log), |_| {
            Err(PrintError::NoSelection)
        });
        assert!(matches!(result, Err(PrintError::NoSelection)));
        assert_eq!(*log.borrow(), vec!["close"]);
    }

    #[test]
    fn test_drop_closes_exactly_once() {
        let log = Log::default();
        {
            let mut session = DeviceSession::new(FakeDevice::boxed(&log));
            session.start_document("d").unwrap();
        }
        assert_eq!(*log.borrow(), vec!["start_doc d", "end_doc", "close"]);
    }

    #[test]
    fn test_finish_prefers_body_error() {
        let result: Result<()> = finish(
            Err(PrintError::NoSelection),
            Err(PrintError::device("x", "y")),
        );
        assert!(matches!(result, Err(PrintError::NoSelection)));
        let result = finish(Ok(1), Err(PrintError::device("x", "y")));
        assert!(matches!(result, Err(PrintError::Device { .. })));
    }
}
