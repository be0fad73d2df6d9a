/// Declares a surrogate-key newtype for one datastore table.
///
/// `define_key_type!(DesignId, "mask_designs")` yields `DesignId(pub i64)` with
/// serde support, `Display` as the bare number, `From` conversions both ways,
/// `new`/`value`, and `DesignId::TABLE` naming the owning table so errors can
/// carry it.
#[macro_export]
macro_rules! define_key_type {
    ($name:ident, $table:literal) => {
        #[derive(
            Debug,
            Copy,
            Clone,
            PartialEq,
            Eq,
            PartialOrd,
            Ord,
            Hash,
            serde::Serialize,
            serde::Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl $name {
            /// Table this key belongs to.
            pub const TABLE: &'static str = $table;

            pub fn new(value: i64) -> Self {
                $name(value)
            }

            pub fn value(&self) -> i64 {
                self.0
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                ::std::write!(f, "{}", self.0)
            }
        }

        impl ::std::convert::From<i64> for $name {
            fn from(v: i64) -> Self {
                $name(v)
            }
        }

        impl ::std::convert::From<$name> for i64 {
            fn from(v: $name) -> Self {
                v.0
            }
        }
    };
}
