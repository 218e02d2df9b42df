/// A mouse click in frame pixel coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClickEvent {
    pub x: i32,
    pub y: i32,
}

impl ClickEvent {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Single-slot mailbox between the window's input handling and the
/// frame loop. A newer click replaces an unread one.
#[derive(Debug, Default)]
pub struct ClickInbox {
    pending: Option<ClickEvent>,
}

impl ClickInbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn post(&mut self, click: ClickEvent) {
        if let Some(dropped) = self.pending.replace(click) {
            log::debug!("Click at ({}, {}) superseded before processing", dropped.x, dropped.y);
        }
    }

    pub fn take(&mut self) -> Option<ClickEvent> {
        self.pending.take()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_take_on_empty_inbox_is_none() {
        let mut inbox = ClickInbox::new();
        assert!(inbox.is_empty());
        assert_eq!(inbox.take(), None);
    }

    #[test]
    fn test_take_drains_the_slot() {
        let mut inbox = ClickInbox::new();
        inbox.post(ClickEvent::new(5, 6));

        assert_eq!(inbox.take(), Some(ClickEvent::new(5, 6)));
        assert_eq!(inbox.take(), None);
    }

    #[test]
    fn test_latest_click_wins() {
        let mut inbox = ClickInbox::new();
        inbox.post(ClickEvent::new(1, 1));
        inbox.post(ClickEvent::new(2, 2));

        assert_eq!(inbox.take(), Some(ClickEvent::new(2, 2)));
        assert!(inbox.is_empty());
    }
}
