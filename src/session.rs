//! Translation sessions: independent widgets bound to frozen text.
//!
//! Every session owns its request lifecycle. Each issued request carries the
//! session's generation at issue time, and only a reply whose generation is
//! still current may change what the session shows. Older replies are
//! dropped silently, which is how a slow answer to a superseded language
//! choice is kept from overwriting a newer one.

use crate::gateway::{TranslationReply, TranslationRequest};
use crate::languages::{self, AUTO};
use crate::logger;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(u64);

impl SessionId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Idle,
    Pending,
    Done,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    Applied,
    /// Reply for a superseded generation; nothing changed.
    Stale,
}

#[derive(Debug, Clone)]
pub struct TranslationSession {
    id: SessionId,
    bound_text: String,
    source_lang: String,
    target_lang: String,
    status: SessionStatus,
    result_text: Option<String>,
    detected_lang: Option<String>,
    error_message: Option<String>,
    auto_label: String,
    generation: u64,
    /// Source language of the request for `generation`.
    issued_source: String,
}

impl TranslationSession {
    fn new(id: SessionId, text: &str, source: &str, target: &str) -> Self {
        Self {
            id,
            bound_text: text.to_string(),
            source_lang: source.to_string(),
            target_lang: target.to_string(),
            status: SessionStatus::Idle,
            result_text: None,
            detected_lang: None,
            error_message: None,
            auto_label: AUTO.to_string(),
            generation: 0,
            issued_source: source.to_string(),
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn bound_text(&self) -> &str {
        &self.bound_text
    }

    pub fn source_lang(&self) -> &str {
        &self.source_lang
    }

    pub fn target_lang(&self) -> &str {
        &self.target_lang
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn result_text(&self) -> Option<&str> {
        self.result_text.as_deref()
    }

    pub fn detected_lang(&self) -> Option<&str> {
        self.detected_lang.as_deref()
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Label of the `auto` entry in the source picker.
    pub fn auto_label(&self) -> &str {
        &self.auto_label
    }

    /// Text for the result region.
    pub fn status_line(&self) -> String {
        match self.status {
            SessionStatus::Idle => String::new(),
            SessionStatus::Pending => "Translating…".to_string(),
            SessionStatus::Done => self.result_text.clone().unwrap_or_default(),
            SessionStatus::Error => format!("Error: {}", self.error_message.as_deref().unwrap_or("unknown")),
        }
    }

    /// Starts a new generation and returns the request for it.
    fn issue(&mut self) -> TranslationRequest {
        self.generation += 1;
        self.status = SessionStatus::Pending;
        self.issued_source = self.source_lang.clone();
        TranslationRequest {
            session: self.id,
            generation: self.generation,
            text: self.bound_text.clone(),
            from: self.source_lang.clone(),
            to: self.target_lang.clone(),
        }
    }

    fn set_source(&mut self, lang: &str) -> Option<TranslationRequest> {
        if self.source_lang == lang {
            return None;
        }
        self.source_lang = lang.to_string();
        Some(self.issue())
    }

    fn set_target(&mut self, lang: &str) -> Option<TranslationRequest> {
        if self.target_lang == lang {
            return None;
        }
        self.target_lang = lang.to_string();
        Some(self.issue())
    }

    fn apply(&mut self, reply: TranslationReply) -> Applied {
        if reply.generation != self.generation || self.status != SessionStatus::Pending {
            return Applied::Stale;
        }
        match reply.outcome {
            Ok(t) => {
                self.status = SessionStatus::Done;
                self.error_message = None;
                self.auto_label = if self.issued_source == AUTO {
                    languages::auto_label(Some(&t.detected_source_language))
                } else {
                    AUTO.to_string()
                };
                self.detected_lang = Some(t.detected_source_language).filter(|d| !d.is_empty());
                self.result_text = Some(t.text);
            }
            Err(e) => {
                self.status = SessionStatus::Error;
                self.result_text = None;
                self.error_message = Some(e.to_string());
            }
        }
        Applied::Applied
    }
}

/// All open sessions, in creation order (the vertical stack on screen).
#[derive(Debug, Default)]
pub struct SessionStack {
    sessions: Vec<TranslationSession>,
    next_id: u64,
}

impl SessionStack {
    /// Creates a session bound to `text` and returns its first request.
    pub fn open(&mut self, text: &str, source: &str, target: &str) -> (SessionId, TranslationRequest) {
        self.next_id += 1;
        let id = SessionId(self.next_id);
        let mut session = TranslationSession::new(id, text, source, target);
        let request = session.issue();
        self.sessions.push(session);
        logger::info(&format!("Session {id} opened ({} chars, {source} -> {target})", text.chars().count()));
        (id, request)
    }

    /// Removes the session. Closing an unknown or already closed id is a no-op.
    pub fn close(&mut self, id: SessionId) -> bool {
        let before = self.sessions.len();
        self.sessions.retain(|s| s.id != id);
        let closed = self.sessions.len() != before;
        if closed {
            logger::info(&format!("Session {id} closed"));
        }
        closed
    }

    pub fn get(&self, id: SessionId) -> Option<&TranslationSession> {
        self.sessions.iter().find(|s| s.id == id)
    }

    fn get_mut(&mut self, id: SessionId) -> Option<&mut TranslationSession> {
        self.sessions.iter_mut().find(|s| s.id == id)
    }

    pub fn set_source_lang(&mut self, id: SessionId, lang: &str) -> Option<TranslationRequest> {
        self.get_mut(id)?.set_source(lang)
    }

    pub fn set_target_lang(&mut self, id: SessionId, lang: &str) -> Option<TranslationRequest> {
        self.get_mut(id)?.set_target(lang)
    }

    /// Routes a reply to its session. Replies for closed sessions and stale
    /// generations are dropped.
    pub fn apply(&mut self, reply: TranslationReply) -> Applied {
        let (id, generation) = (reply.session, reply.generation);
        let outcome = match self.get_mut(id) {
            Some(session) => session.apply(reply),
            None => Applied::Stale,
        };
        if outcome == Applied::Stale {
            logger::debug(&format!("Dropped reply for session {id} generation {generation}"));
        }
        outcome
    }

    pub fn iter(&self) -> impl Iterator<Item = &TranslationSession> {
        self.sessions.iter()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn any_pending(&self) -> bool {
        self.sessions.iter().any(|s| s.status == SessionStatus::Pending)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::{GatewayError, Translation};

    fn ok(req: &TranslationRequest, text: &str, detected: &str) -> TranslationReply {
        TranslationReply::to(
            req,
            Ok(Translation { text: text.into(), detected_source_language: detected.into() }),
        )
    }

    #[test]
    fn open_issues_the_first_request() {
        let mut stack = SessionStack::default();
        let (id, req) = stack.open("Bonjour", "auto", "en");
        assert_eq!(req.session, id);
        assert_eq!(req.generation, 1);
        assert_eq!((req.text.as_str(), req.from.as_str(), req.to.as_str()), ("Bonjour", "auto", "en"));

        let s = stack.get(id).unwrap();
        assert_eq!(s.status(), SessionStatus::Pending);
        assert_eq!(s.status_line(), "Translating…");
    }

    #[test]
    fn done_with_auto_names_the_detected_language() {
        let mut stack = SessionStack::default();
        let (id, req) = stack.open("Bonjour", "auto", "en");
        assert_eq!(stack.apply(ok(&req, "Hello", "fr")), Applied::Applied);

        let s = stack.get(id).unwrap();
        assert_eq!(s.status(), SessionStatus::Done);
        assert_eq!(s.result_text(), Some("Hello"));
        assert_eq!(s.detected_lang(), Some("fr"));
        assert_eq!(s.auto_label(), "Français (auto)");
        assert_eq!(s.status_line(), "Hello");
    }

    #[test]
    fn explicit_source_reverts_the_auto_label() {
        let mut stack = SessionStack::default();
        let (id, req) = stack.open("Bonjour", "auto", "en");
        stack.apply(ok(&req, "Hello", "fr"));

        let req = stack.set_source_lang(id, "fr").unwrap();
        assert_eq!(req.generation, 2);
        stack.apply(ok(&req, "Hello", "fr"));
        assert_eq!(stack.get(id).unwrap().auto_label(), "auto");
    }

    #[test]
    fn stale_reply_never_overwrites_a_newer_one() {
        let mut stack = SessionStack::default();
        let (id, g1) = stack.open("Bonjour", "auto", "en");
        let g2 = stack.set_target_lang(id, "de").unwrap();

        assert_eq!(stack.apply(ok(&g2, "Hallo", "fr")), Applied::Applied);
        assert_eq!(stack.apply(ok(&g1, "Hello", "fr")), Applied::Stale);

        let s = stack.get(id).unwrap();
        assert_eq!(s.result_text(), Some("Hallo"));
        assert_eq!(s.target_lang(), "de");
    }

    #[test]
    fn stale_reply_arriving_first_keeps_the_session_pending() {
        let mut stack = SessionStack::default();
        let (id, g1) = stack.open("Bonjour", "auto", "en");
        let g2 = stack.set_target_lang(id, "de").unwrap();

        assert_eq!(stack.apply(ok(&g1, "Hello", "fr")), Applied::Stale);
        assert_eq!(stack.get(id).unwrap().status(), SessionStatus::Pending);
        stack.apply(ok(&g2, "Hallo", "fr"));
        assert_eq!(stack.get(id).unwrap().result_text(), Some("Hallo"));
    }

    #[test]
    fn same_language_is_not_a_change() {
        let mut stack = SessionStack::default();
        let (id, _) = stack.open("Bonjour", "auto", "en");
        assert!(stack.set_target_lang(id, "en").is_none());
        assert!(stack.set_source_lang(id, "auto").is_none());
        assert_eq!(stack.get(id).unwrap().generation(), 1);
    }

    #[test]
    fn error_is_local_to_its_session() {
        let mut stack = SessionStack::default();
        let (a, req_a) = stack.open("Bonjour", "auto", "en");
        let (b, req_b) = stack.open("Danke", "auto", "en");
        stack.apply(ok(&req_b, "Thanks", "de"));

        let failure = GatewayError::Status { status: 500, detail: String::new() };
        stack.apply(TranslationReply::to(&req_a, Err(failure)));

        let sa = stack.get(a).unwrap();
        assert_eq!(sa.status(), SessionStatus::Error);
        assert_eq!(sa.error_message(), Some("HTTP 500"));
        assert_eq!(sa.status_line(), "Error: HTTP 500");

        let sb = stack.get(b).unwrap();
        assert_eq!(sb.status(), SessionStatus::Done);
        assert_eq!(sb.result_text(), Some("Thanks"));
    }

    #[test]
    fn retry_after_error_by_changing_language() {
        let mut stack = SessionStack::default();
        let (id, req) = stack.open("Bonjour", "auto", "en");
        stack.apply(TranslationReply::to(&req, Err(GatewayError::Transport("offline".into()))));
        let req = stack.set_target_lang(id, "it").unwrap();
        stack.apply(ok(&req, "Ciao", "fr"));
        let s = stack.get(id).unwrap();
        assert_eq!(s.status(), SessionStatus::Done);
        assert_eq!(s.error_message(), None);
    }

    #[test]
    fn close_is_idempotent_and_late_replies_are_dropped() {
        let mut stack = SessionStack::default();
        let (id, req) = stack.open("Bonjour", "auto", "en");
        assert!(stack.close(id));
        assert!(!stack.close(id));
        assert!(stack.is_empty());
        assert_eq!(stack.apply(ok(&req, "Hello", "fr")), Applied::Stale);
        assert!(stack.set_target_lang(id, "de").is_none());
    }

    #[test]
    fn ids_are_unique_and_stack_keeps_creation_order() {
        let mut stack = SessionStack::default();
        let (a, _) = stack.open("one", "auto", "en");
        let (b, _) = stack.open("two", "auto", "en");
        stack.close(a);
        let (c, _) = stack.open("three", "auto", "en");
        assert_ne!(a, c);
        assert_eq!(stack.iter().map(|s| s.id()).collect::<Vec<_>>(), vec![b, c]);
    }
}
