// src/session.rs
//! The single editing session: document, photo, theme and the UI flags around them.
//!
//! The web layer keeps one `CvSession` behind a mutex and never holds the lock
//! across the generative call or the rasterizer. AI generation is split into
//! `begin_generation` / `finish_generation` so a result can be matched against
//! the request that produced it; cancelling bumps the generation counter and any
//! late result for the old ticket is dropped.

use serde::Serialize;

use crate::ai_fill::AiFillError;
use crate::app_log;
use crate::editor::{Key, TagInput, TagList, Update};
use crate::export::ExportError;
use crate::preview::PreviewLayout;
use crate::types::{CvDocument, Photo, Theme};

/// Identifies one in-flight generation request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerationTicket(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationOutcome {
    /// The document was replaced and the modal closed
    Applied,
    /// The document is unchanged and `ai_error` is set
    Failed,
    /// The ticket was cancelled; nothing changed
    Stale,
}

/// Snapshot of the session flags for the UI
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionState {
    pub theme: Theme,
    pub has_photo: bool,
    pub ai_modal_open: bool,
    pub ai_loading: bool,
    pub ai_error: Option<String>,
    pub export_error: Option<String>,
    pub skill_input: String,
    pub language_input: String,
}

#[derive(Debug, Default)]
pub struct CvSession {
    document: CvDocument,
    photo: Option<Photo>,
    theme: Theme,
    ai_modal_open: bool,
    ai_loading: bool,
    ai_error: Option<String>,
    export_error: Option<String>,
    skill_input: TagInput,
    language_input: TagInput,
    generation: u64,
}

impl CvSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(document: CvDocument) -> Self {
        Self {
            document,
            ..Self::default()
        }
    }

    // ===== Document =====

    pub fn document(&self) -> &CvDocument {
        &self.document
    }

    pub fn replace_document(&mut self, document: CvDocument) {
        self.document = document;
    }

    pub fn apply(&mut self, update: Update) -> bool {
        self.document.apply(update)
    }

    // ===== Theme and photo =====

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn set_theme(&mut self, theme: Theme) {
        self.theme = theme;
    }

    pub fn photo(&self) -> Option<&Photo> {
        self.photo.as_ref()
    }

    pub fn set_photo(&mut self, photo: Photo) {
        self.photo = Some(photo);
    }

    pub fn clear_photo(&mut self) {
        self.photo = None;
    }

    // ===== Tag inputs =====

    pub fn tag_input(&self, list: TagList) -> &TagInput {
        match list {
            TagList::Skills => &self.skill_input,
            TagList::Languages => &self.language_input,
        }
    }

    fn tag_input_mut(&mut self, list: TagList) -> &mut TagInput {
        match list {
            TagList::Skills => &mut self.skill_input,
            TagList::Languages => &mut self.language_input,
        }
    }

    pub fn set_tag_input(&mut self, list: TagList, value: impl Into<String>) {
        self.tag_input_mut(list).set(value);
    }

    /// Add the buffered tag; returns whether a tag was added
    pub fn submit_tag(&mut self, list: TagList) -> bool {
        match self.tag_input_mut(list).submit(list) {
            Some(update) => self.document.apply(update),
            None => false,
        }
    }

    pub fn tag_key(&mut self, list: TagList, key: &Key) -> bool {
        match self.tag_input_mut(list).key(list, key) {
            Some(update) => self.document.apply(update),
            None => false,
        }
    }

    // ===== AI fill =====

    pub fn open_ai_modal(&mut self) {
        self.ai_modal_open = true;
    }

    /// Close the modal; a generation still running is cancelled
    pub fn close_ai_modal(&mut self) {
        self.ai_modal_open = false;
        if self.ai_loading {
            self.cancel_generation();
        }
    }

    pub fn ai_loading(&self) -> bool {
        self.ai_loading
    }

    /// Start a generation. `None` while another one is still in flight.
    pub fn begin_generation(&mut self) -> Option<GenerationTicket> {
        if self.ai_loading {
            return None;
        }
        self.generation += 1;
        self.ai_loading = true;
        self.ai_error = None;
        Some(GenerationTicket(self.generation))
    }

    pub fn finish_generation(
        &mut self,
        ticket: GenerationTicket,
        result: Result<CvDocument, AiFillError>,
    ) -> GenerationOutcome {
        if ticket.0 != self.generation || !self.ai_loading {
            app_log!(info, "Discarding result of cancelled generation {}", ticket.0);
            return GenerationOutcome::Stale;
        }
        self.ai_loading = false;

        match result {
            Ok(document) => {
                self.document = document;
                self.ai_modal_open = false;
                GenerationOutcome::Applied
            }
            Err(e) => {
                app_log!(warn, "Generation {} failed: {}", ticket.0, e);
                self.ai_error = Some(e.user_message().to_string());
                GenerationOutcome::Failed
            }
        }
    }

    /// Invalidate the in-flight ticket, if any
    pub fn cancel_generation(&mut self) {
        if self.ai_loading {
            app_log!(info, "Cancelling generation {}", self.generation);
            self.generation += 1;
            self.ai_loading = false;
        }
    }

    // ===== Preview and export =====

    pub fn layout(&self) -> PreviewLayout {
        PreviewLayout::build(&self.document, self.photo.as_ref(), self.theme)
    }

    pub fn record_export_failure(&mut self, error: &ExportError) {
        self.export_error = Some(error.user_message().to_string());
    }

    pub fn clear_export_error(&mut self) {
        self.export_error = None;
    }

    pub fn state(&self) -> SessionState {
        SessionState {
            theme: self.theme,
            has_photo: self.photo.is_some(),
            ai_modal_open: self.ai_modal_open,
            ai_loading: self.ai_loading,
            ai_error: self.ai_error.clone(),
            export_error: self.export_error.clone(),
            skill_input: self.skill_input.value().to_string(),
            language_input: self.language_input.value().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai_fill::AI_FILL_FAILED_MESSAGE;
    use crate::editor::{EntryList, TextField};
    use crate::export::EXPORT_FAILED_MESSAGE;

    fn generated(name: &str) -> CvDocument {
        CvDocument {
            full_name: name.to_string(),
            skills: vec!["Rust".to_string()],
            ..Default::default()
        }
    }

    #[test]
    fn test_defaults() {
        let session = CvSession::new();
        let state = session.state();
        assert_eq!(state.theme, Theme::Multi);
        assert!(!state.has_photo);
        assert!(!state.ai_modal_open);
        assert!(!state.ai_loading);
        assert_eq!(session.document(), &CvDocument::default());
    }

    #[test]
    fn test_successful_generation_replaces_document_and_closes_modal() {
        let mut session = CvSession::new();
        session.apply(Update::AddEntry {
            list: EntryList::Projects,
        });
        session.open_ai_modal();

        let ticket = session.begin_generation().unwrap();
        assert!(session.state().ai_loading);

        let outcome = session.finish_generation(ticket, Ok(generated("Ada")));
        assert_eq!(outcome, GenerationOutcome::Applied);
        assert_eq!(session.document(), &generated("Ada"));
        assert!(session.document().projects.is_empty());

        let state = session.state();
        assert!(!state.ai_loading);
        assert!(!state.ai_modal_open);
        assert_eq!(state.ai_error, None);
    }

    #[test]
    fn test_failed_generation_keeps_document() {
        let mut session = CvSession::new();
        session.apply(Update::SetText {
            field: TextField::FullName,
            value: "Keep Me".to_string(),
        });
        let before = session.document().clone();
        session.open_ai_modal();

        let ticket = session.begin_generation().unwrap();
        let outcome = session.finish_generation(
            ticket,
            Err(AiFillError::Service(anyhow::anyhow!("network down"))),
        );

        assert_eq!(outcome, GenerationOutcome::Failed);
        assert_eq!(session.document(), &before);
        let state = session.state();
        assert_eq!(state.ai_error.as_deref(), Some(AI_FILL_FAILED_MESSAGE));
        assert!(state.ai_modal_open);
        assert!(!state.ai_loading);

        // a new attempt clears the previous error
        session.begin_generation().unwrap();
        assert_eq!(session.state().ai_error, None);
    }

    #[test]
    fn test_single_generation_in_flight() {
        let mut session = CvSession::new();
        let first = session.begin_generation();
        assert!(first.is_some());
        assert!(session.begin_generation().is_none());
    }

    #[test]
    fn test_cancelled_generation_result_is_discarded() {
        let mut session = CvSession::new();
        session.open_ai_modal();
        let ticket = session.begin_generation().unwrap();

        session.close_ai_modal();
        assert!(!session.state().ai_loading);

        let outcome = session.finish_generation(ticket, Ok(generated("Late")));
        assert_eq!(outcome, GenerationOutcome::Stale);
        assert_eq!(session.document(), &CvDocument::default());

        // a fresh generation gets a new ticket and is applied
        let next = session.begin_generation().unwrap();
        assert_ne!(next, ticket);
        assert_eq!(
            session.finish_generation(next, Ok(generated("Fresh"))),
            GenerationOutcome::Applied
        );
        assert_eq!(session.document().full_name, "Fresh");
    }

    #[test]
    fn test_edits_during_generation_are_overwritten() {
        let mut session = CvSession::new();
        let ticket = session.begin_generation().unwrap();
        session.apply(Update::SetText {
            field: TextField::Title,
            value: "Typed meanwhile".to_string(),
        });

        session.finish_generation(ticket, Ok(generated("Ada")));
        assert_eq!(session.document().title, "");
    }

    #[test]
    fn test_tag_submit_and_enter() {
        let mut session = CvSession::new();
        session.set_tag_input(TagList::Skills, "  Rust  ");
        assert!(session.submit_tag(TagList::Skills));
        assert_eq!(session.document().skills, vec!["Rust"]);
        assert_eq!(session.state().skill_input, "");

        session.set_tag_input(TagList::Languages, "   ");
        assert!(!session.submit_tag(TagList::Languages));
        assert_eq!(session.state().language_input, "   ");

        session.set_tag_input(TagList::Languages, "French");
        assert!(!session.tag_key(TagList::Languages, &Key::Other));
        assert!(session.tag_key(TagList::Languages, &Key::Enter));
        assert_eq!(session.document().languages, vec!["French"]);
        assert_eq!(session.tag_input(TagList::Languages).value(), "");
    }

    #[test]
    fn test_photo_theme_and_layout() {
        let mut session = CvSession::new();
        session.set_theme(Theme::Orange);
        assert_eq!(session.theme(), Theme::Orange);
        session.set_photo(Photo::from_data_uri("data:image/png;base64,AAAA").unwrap());

        let layout = session.layout();
        assert_eq!(layout.theme, Theme::Orange);
        assert!(session.state().has_photo);

        session.clear_photo();
        assert!(session.photo().is_none());
    }

    #[test]
    fn test_export_error_flag() {
        let mut session = CvSession::new();
        session.record_export_failure(&ExportError::Encode(anyhow::anyhow!("bad png")));
        assert_eq!(
            session.state().export_error.as_deref(),
            Some(EXPORT_FAILED_MESSAGE)
        );
        session.clear_export_error();
        assert_eq!(session.state().export_error, None);
    }
}
