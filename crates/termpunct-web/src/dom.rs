#![forbid(unsafe_code)]

//! DOM event name mapping.

use termpunct_core::SurfaceEvent;

/// DOM events the passthrough listens to on the terminal's `<textarea>`.
///
/// `keydown` is deliberately absent: the terminal's own key handler decides
/// which keydowns signal the arbiter (`onImePunctuationKeydown`).
pub const LISTENED_EVENTS: [&str; 5] = [
    "compositionstart",
    "compositionupdate",
    "compositionend",
    "input",
    "blur",
];

/// Fields read off a native DOM event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DomEventFields {
    /// `CompositionEvent.data` / `InputEvent.data`.
    pub data: Option<String>,
    /// `InputEvent.isComposing`.
    pub is_composing: bool,
    /// `KeyboardEvent.key`.
    pub key: Option<String>,
}

/// Map a DOM event type plus its fields to a [`SurfaceEvent`].
///
/// Returns `None` for event types the passthrough does not handle.
#[must_use]
pub fn surface_event_from_dom(event_type: &str, fields: DomEventFields) -> Option<SurfaceEvent> {
    Some(match event_type {
        "compositionstart" => SurfaceEvent::CompositionStart,
        "compositionupdate" => SurfaceEvent::CompositionUpdate { data: fields.data },
        "compositionend" => SurfaceEvent::CompositionEnd { data: fields.data },
        "input" => SurfaceEvent::Input {
            data: fields.data.filter(|d| !d.is_empty()),
            is_composing: fields.is_composing,
        },
        "blur" | "focusout" => SurfaceEvent::Blur,
        "keydown" => SurfaceEvent::Keydown { key: fields.key? },
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn composition_events_map() {
        assert_eq!(
            surface_event_from_dom("compositionstart", DomEventFields::default()),
            Some(SurfaceEvent::CompositionStart)
        );
        assert_eq!(
            surface_event_from_dom(
                "compositionend",
                DomEventFields {
                    data: Some("你好".into()),
                    ..DomEventFields::default()
                }
            ),
            Some(SurfaceEvent::CompositionEnd {
                data: Some("你好".into())
            })
        );
    }

    #[test]
    fn empty_input_data_is_missing() {
        assert_eq!(
            surface_event_from_dom(
                "input",
                DomEventFields {
                    data: Some(String::new()),
                    ..DomEventFields::default()
                }
            ),
            Some(SurfaceEvent::Input {
                data: None,
                is_composing: false
            })
        );
    }

    #[test]
    fn keydown_requires_key() {
        assert_eq!(surface_event_from_dom("keydown", DomEventFields::default()), None);
        assert_eq!(
            surface_event_from_dom(
                "keydown",
                DomEventFields {
                    key: Some(",".into()),
                    ..DomEventFields::default()
                }
            ),
            Some(SurfaceEvent::Keydown { key: ",".into() })
        );
    }

    #[test]
    fn every_listened_event_maps() {
        for name in LISTENED_EVENTS {
            assert!(
                surface_event_from_dom(name, DomEventFields::default()).is_some(),
                "{name} should map"
            );
        }
    }

    proptest! {
        #[test]
        fn unknown_event_types_are_ignored(name in "[a-z]{1,12}") {
            prop_assume!(!LISTENED_EVENTS.contains(&name.as_str()));
            prop_assume!(name != "keydown" && name != "focusout");
            prop_assert_eq!(surface_event_from_dom(&name, DomEventFields::default()), None);
        }
    }
}
