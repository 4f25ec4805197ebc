use crate::types::Voice;
use crate::SpeechEngine;

/// The voices an engine offers, plus the user's current choice.
///
/// The list may start out empty and fill in later; callers reload it on
/// [`EngineEvent::VoicesChanged`](crate::EngineEvent::VoicesChanged).
#[derive(Debug, Clone, Default)]
pub struct VoiceCatalog {
    voices: Vec<Voice>,
    selected: Option<String>,
}

impl VoiceCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog from the engine's current voice list.
    pub fn load<E: SpeechEngine + ?Sized>(engine: &E) -> Self {
        let mut catalog = Self::new();
        catalog.refresh(engine);
        catalog
    }

    /// Re-fetch the voice list from the engine, replacing the stored one.
    ///
    /// Enumeration failures are logged and treated as an empty list.
    pub fn refresh<E: SpeechEngine + ?Sized>(&mut self, engine: &E) {
        let voices = engine.voices().unwrap_or_else(|e| {
            log::warn!("Voice enumeration failed: {e}");
            Vec::new()
        });
        self.replace(voices);
    }

    /// Replace the stored list. If nothing is selected yet, the first voice
    /// becomes the selection.
    pub fn replace(&mut self, voices: Vec<Voice>) {
        log::debug!("Voice catalog now has {} voices", voices.len());
        self.voices = voices;
        if self.selected.is_none() {
            if let Some(first) = self.voices.first() {
                log::info!("Defaulting to voice '{}'", first.name);
                self.selected = Some(first.name.clone());
            }
        }
    }

    pub fn voices(&self) -> &[Voice] {
        &self.voices
    }

    pub fn is_empty(&self) -> bool {
        self.voices.is_empty()
    }

    /// Name of the selected voice, if any.
    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    /// The selected voice, if it is still present in the list.
    pub fn selected_voice(&self) -> Option<&Voice> {
        let name = self.selected.as_deref()?;
        self.find(name)
    }

    pub fn find(&self, name: &str) -> Option<&Voice> {
        self.voices.iter().find(|v| v.name == name)
    }

    /// Select a voice by name. Unknown names are ignored and `false` returned.
    pub fn select(&mut self, name: &str) -> bool {
        if self.find(name).is_none() {
            log::warn!("Voice '{name}' is not in the catalog");
            return false;
        }
        self.selected = Some(name.to_string());
        true
    }

    /// Remember a selection before the list is available.
    ///
    /// The name is kept even if no such voice is listed yet, so a preferred
    /// voice from settings wins over the first-voice default.
    pub fn prefer(&mut self, name: impl Into<String>) {
        self.selected = Some(name.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engines::scripted::ScriptedEngine;

    fn voice(name: &str) -> Voice {
        Voice::new(name, "en-us")
    }

    #[test]
    fn empty_catalog_leaves_selection_unset() {
        let engine = ScriptedEngine::new();
        let catalog = VoiceCatalog::load(&engine);
        assert!(catalog.is_empty());
        assert_eq!(catalog.selected(), None);
    }

    #[test]
    fn first_voice_becomes_default() {
        let engine = ScriptedEngine::with_voices(vec![voice("VoiceA"), voice("VoiceB")]);
        let catalog = VoiceCatalog::load(&engine);
        assert_eq!(catalog.selected(), Some("VoiceA"));
        assert_eq!(catalog.selected_voice().map(|v| v.name.as_str()), Some("VoiceA"));
    }

    #[test]
    fn default_applies_once_list_arrives_late() {
        let mut engine = ScriptedEngine::new();
        let mut catalog = VoiceCatalog::load(&engine);
        assert_eq!(catalog.selected(), None);

        engine.set_voices(vec![voice("VoiceA"), voice("VoiceB")]);
        catalog.refresh(&engine);
        assert_eq!(catalog.selected(), Some("VoiceA"));
    }

    #[test]
    fn refresh_keeps_existing_selection() {
        let mut engine = ScriptedEngine::with_voices(vec![voice("VoiceA"), voice("VoiceB")]);
        let mut catalog = VoiceCatalog::load(&engine);
        assert!(catalog.select("VoiceB"));

        engine.set_voices(vec![voice("VoiceC"), voice("VoiceB")]);
        catalog.refresh(&engine);
        assert_eq!(catalog.selected(), Some("VoiceB"));
    }

    #[test]
    fn selecting_unknown_voice_is_ignored() {
        let engine = ScriptedEngine::with_voices(vec![voice("VoiceA")]);
        let mut catalog = VoiceCatalog::load(&engine);
        assert!(!catalog.select("Nope"));
        assert_eq!(catalog.selected(), Some("VoiceA"));
    }

    #[test]
    fn preferred_voice_wins_over_default() {
        let engine = ScriptedEngine::with_voices(vec![voice("VoiceA"), voice("VoiceB")]);
        let mut catalog = VoiceCatalog::new();
        catalog.prefer("VoiceB");
        catalog.refresh(&engine);
        assert_eq!(catalog.selected(), Some("VoiceB"));
    }

    #[test]
    fn vanished_selection_resolves_to_none() {
        let mut engine = ScriptedEngine::with_voices(vec![voice("VoiceA")]);
        let mut catalog = VoiceCatalog::load(&engine);
        engine.set_voices(vec![voice("VoiceB")]);
        catalog.refresh(&engine);
        assert_eq!(catalog.selected(), Some("VoiceA"));
        assert!(catalog.selected_voice().is_none());
    }
}
