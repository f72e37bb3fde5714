//! Patch application.

use crate::value::{Document, Message, Value};

/// Apply every present field of `patch` to `main`. Map fields are upserted
/// key by key without descending into the entries; any other field is
/// replaced wholesale. Fields absent from `patch` are left alone.
pub fn merge(main: &mut Message, patch: &Message) {
    for number in patch.present_fields() {
        let Some(value) = patch.get(number) else {
            continue;
        };
        match (main.get_mut(number), value) {
            (Some(Value::Map(target)), Value::Map(entries)) => {
                for (key, entry) in entries {
                    target.insert(key.clone(), entry.clone());
                }
                main.mark_present(number);
            }
            _ => main.set(number, value.clone()),
        }
    }
}

/// Merge a built patch document into `main`.
pub fn merge_document(main: &mut Document, patch: &Document) {
    #[cfg(feature = "tracing")]
    tracing::debug!(sheet = %main.sheet, patch = %patch.sheet, "applying patch");
    merge(&mut main.root, &patch.root);
    main.present |= patch.present;
}
