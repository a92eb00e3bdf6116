//! `define_port_error!`: builds a `thiserror` enum plus one snake_case
//! constructor per variant, taking `impl Into<T>` for every field.

macro_rules! define_port_error {
    (@ctor $variant:ident) => {
        ::paste::paste! {
            pub fn [<$variant:snake>]() -> Self {
                Self::$variant
            }
        }
    };

    (@ctor $variant:ident { $($field:ident : $ty:ty),* $(,)? }) => {
        define_port_error!(@ctor_impl $variant () () $( $field : $ty, )*);
    };

    (@ctor_impl $variant:ident ($($params:tt)*) ($($inits:tt)*) ) => {
        ::paste::paste! {
            pub fn [<$variant:snake>]($($params)*) -> Self {
                Self::$variant { $($inits)* }
            }
        }
    };

    (@ctor_impl $variant:ident ($($params:tt)*) ($($inits:tt)*) $field:ident : $ty:ty, $($rest:tt)*) => {
        define_port_error!(
            @ctor_impl
            $variant
            ($($params)* $field: impl Into<$ty>,)
            ($($inits)* $field: $field.into(),)
            $($rest)*
        );
    };
    (
        $(#[$outer:meta])*
        pub enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident $( { $($field:ident : $ty:ty),* $(,)? } )? => $message:expr
            ),* $(,)?
        }
    ) => {
        $(#[$outer])*
        #[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
        pub enum $name {
            $(
                $(#[$variant_meta])*
                #[error($message)]
                $variant $( { $($field : $ty),* } )?,
            )*
        }

        impl $name {
            $(
                define_port_error!(@ctor $variant $( { $($field : $ty),* } )?);
            )*
        }
    };
}

pub(crate) use define_port_error;

#[cfg(test)]
mod tests {
    define_port_error! {
        pub enum StorePortError {
            Offline { message: String } => "store offline: {message}",
            Missing { id: u32 } => "nothing stored under {id}",
            Rejected { reason: String, attempts: u32 } => "{reason} after {attempts} attempts",
            Full => "store is full",
        }
    }

    #[test]
    fn string_fields_take_str_slices() {
        assert_eq!(StorePortError::offline("timeout").to_string(), "store offline: timeout");
    }

    #[test]
    fn numeric_fields_keep_their_type() {
        assert_eq!(StorePortError::missing(7_u32).to_string(), "nothing stored under 7");
    }

    #[test]
    fn mixed_and_unit_variants_get_constructors() {
        assert_eq!(
            StorePortError::rejected("quota", 3_u32).to_string(),
            "quota after 3 attempts"
        );
        assert_eq!(StorePortError::full(), StorePortError::Full);
    }
}
