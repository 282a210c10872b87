/// Implements [`PropertyTarget`](crate::binding::PropertyTarget) for a plain struct.
///
/// Each entry maps an exposed property name to a field. The property kind is taken
/// from the field's [`PropertyValue`](crate::value::PropertyValue) implementation.
///
/// ```rust
/// use tenkai::binding::set_string;
/// use tenkai::reflect_properties;
///
/// #[derive(Default)]
/// struct Toast { title: String, seconds: i64 }
///
/// reflect_properties!(Toast {
///     "Title" => title: String,
///     "Seconds" => seconds: i64,
/// });
///
/// let mut toast = Toast::default();
/// assert!(set_string(&mut toast, "Title", "Saved"));
/// assert!(!set_string(&mut toast, "Seconds", "3"));
/// ```
#[macro_export]
macro_rules! reflect_properties {
    ($ty:ident { $( $name:literal => $field:ident : $fty:ty ),* $(,)? }) => {
        impl $crate::binding::PropertyTarget for $ty {
            fn type_name(&self) -> &str {
                stringify!($ty)
            }

            fn find_property(&self, name: &str) -> Option<$crate::binding::PropertyRef> {
                let kinds: &[(&str, $crate::value::SlotType)] = &[
                    $( ($name, <$fty as $crate::value::PropertyValue>::KIND) ),*
                ];
                kinds
                    .iter()
                    .position(|(n, _)| *n == name)
                    .map(|index| $crate::binding::PropertyRef::new(index, kinds[index].1))
            }

            #[allow(unused_assignments, unused_mut, unused_variables)]
            fn assign(
                &mut self,
                property: &$crate::binding::PropertyRef,
                value: &$crate::value::Value,
            ) -> bool {
                let mut index = 0usize;
                $(
                    if property.index() == index {
                        return match <$fty as $crate::value::PropertyValue>::from_value(value) {
                            Some(converted) => {
                                self.$field = converted;
                                true
                            }
                            None => false,
                        };
                    }
                    index += 1;
                )*
                false
            }
        }
    };
}
