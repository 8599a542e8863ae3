use crate::{SettingsPanel, TranscriptEntry, TrayEntry};

/// Rendering primitives a front-end provides to a [`ChatSession`](crate::ChatSession).
///
/// Input is pushed the other way: the front-end reads its own widgets and
/// calls session methods when the user acts.
pub trait ChatView: Send {
    /// Render a newly appended transcript entry and keep it in view.
    fn append_entry(&mut self, entry: &TranscriptEntry);

    /// Replace the message input's text.
    fn set_input(&mut self, text: &str);

    fn show_settings(&mut self, panel: &SettingsPanel, providers: &[String]);

    fn hide_settings(&mut self);

    /// Redraw the attachment tray.
    fn show_tray(&mut self, entries: &[TrayEntry]);
}

/// A view that renders nothing, for headless use.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullView;

impl ChatView for NullView {
    fn append_entry(&mut self, _entry: &TranscriptEntry) {}
    fn set_input(&mut self, _text: &str) {}
    fn show_settings(&mut self, _panel: &SettingsPanel, _providers: &[String]) {}
    fn hide_settings(&mut self) {}
    fn show_tray(&mut self, _entries: &[TrayEntry]) {}
}
