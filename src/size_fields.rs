//! Size-field registry
//!
//! RIFF list sizes are unknown while their content is being written. Each
//! open list registers a symbolic field here; every byte appended to the
//! file credits all currently-open fields at once, so nested lists stay
//! consistent without walking the container tree. Fields are keyed by
//! identifier rather than by aliasing the header structs.

use std::collections::{HashMap, HashSet};

/// Identifies one backpatchable size field in the container
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SizeField {
    /// Outer RIFF list
    Riff,
    /// hdrl header list
    Hdrl,
    /// Video strl list
    StrlVideo,
    /// Audio strl list
    StrlAudio,
    /// ODML extension list
    Odml,
    /// movi data list
    Movi,
}

/// Set of currently-open size fields plus the accumulated value of every
/// field ever registered
#[derive(Debug, Default)]
pub struct SizeFields {
    open: HashSet<SizeField>,
    values: HashMap<SizeField, u32>,
}

impl SizeFields {
    pub fn new() -> Self {
        SizeFields::default()
    }

    /// Open a field at its initial value. Bytes written before this call
    /// (the field's own header) are not counted.
    pub fn register(&mut self, field: SizeField, initial: u32) {
        self.values.insert(field, initial);
        self.open.insert(field);
    }

    /// Close a field; its value stays readable for backpatching
    pub fn unregister(&mut self, field: SizeField) {
        self.open.remove(&field);
    }

    /// Add `n` bytes to every currently-open field
    pub fn credit(&mut self, n: u32) {
        for field in &self.open {
            if let Some(value) = self.values.get_mut(field) {
                *value += n;
            }
        }
    }

    /// Current value of a field (0 if never registered)
    pub fn value(&self, field: SizeField) -> u32 {
        self.values.get(&field).copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credit_reaches_all_open_fields() {
        let mut fields = SizeFields::new();
        fields.register(SizeField::Riff, 4);
        fields.register(SizeField::Hdrl, 4);
        fields.credit(64);

        assert_eq!(fields.value(SizeField::Riff), 68);
        assert_eq!(fields.value(SizeField::Hdrl), 68);
    }

    #[test]
    fn test_unregistered_field_keeps_value() {
        let mut fields = SizeFields::new();
        fields.register(SizeField::Riff, 4);
        fields.register(SizeField::StrlVideo, 4);
        fields.credit(120);
        fields.unregister(SizeField::StrlVideo);
        fields.credit(100);

        assert_eq!(fields.value(SizeField::StrlVideo), 124);
        assert_eq!(fields.value(SizeField::Riff), 224);
    }

    #[test]
    fn test_value_of_unknown_field() {
        let fields = SizeFields::new();
        assert_eq!(fields.value(SizeField::Movi), 0);
    }

    #[test]
    fn test_nested_bookkeeping() {
        // riff > hdrl > strl: one chunk write under three open lists
        let mut fields = SizeFields::new();
        fields.register(SizeField::Riff, 4);
        fields.register(SizeField::Hdrl, 4);
        fields.register(SizeField::StrlVideo, 4);
        fields.credit(64);
        fields.unregister(SizeField::StrlVideo);
        fields.unregister(SizeField::Hdrl);
        fields.register(SizeField::Movi, 4);
        fields.credit(108);

        assert_eq!(fields.value(SizeField::StrlVideo), 68);
        assert_eq!(fields.value(SizeField::Hdrl), 68);
        assert_eq!(fields.value(SizeField::Movi), 112);
        assert_eq!(fields.value(SizeField::Riff), 176);
    }
}
