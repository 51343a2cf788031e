//! Filling sparse configuration from defaults.
//!
//! Every config type lists its fields explicitly; a field left empty in the
//! user's file takes the default's value.

pub trait Merge {
    /// Fill every empty field of `self` from `defaults`.
    fn merge_defaults(&mut self, defaults: &Self);
}

impl Merge for String {
    fn merge_defaults(&mut self, defaults: &Self) {
        if self.is_empty() {
            self.clone_from(defaults);
        }
    }
}

impl<T: Clone> Merge for Vec<T> {
    fn merge_defaults(&mut self, defaults: &Self) {
        if self.is_empty() {
            self.clone_from(defaults);
        }
    }
}

impl<T: Clone> Merge for Option<T> {
    fn merge_defaults(&mut self, defaults: &Self) {
        if self.is_none() {
            self.clone_from(defaults);
        }
    }
}

/// Implements [`Merge`] for a struct by merging the listed fields.
macro_rules! merge_fields {
    ($ty:ty { $($field:ident),+ $(,)? }) => {
        impl $crate::config::merge::Merge for $ty {
            fn merge_defaults(&mut self, defaults: &Self) {
                $( self.$field.merge_defaults(&defaults.$field); )+
            }
        }
    };
}

pub(crate) use merge_fields;
