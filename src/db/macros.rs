//! Adapter dispatch macro.
//!
//! Generates the match over [`AnyAdapter`](crate::db::adapter::AnyAdapter)
//! variants so each dispatching method stays a one-liner. Expands at compile
//! time with zero runtime overhead.

/// Macro for generating adapter dispatch match arms.
///
/// The body is repeated for every backend variant, with the adapter bound to
/// the given identifier. Variants behind cargo features are only matched when
/// the feature is enabled.
///
/// # Example
///
/// ```ignore
/// pub async fn list_schemas(&self) -> DbResult<Vec<String>> {
///     impl_adapter_dispatch!(self, a => a.list_schemas().await)
/// }
/// ```
#[macro_export]
macro_rules! impl_adapter_dispatch {
    ($adapter:expr, $a:ident => $body:expr) => {
        match $adapter {
            $crate::db::adapter::AnyAdapter::Postgres($a) => $body,
            $crate::db::adapter::AnyAdapter::MySql($a) => $body,
            $crate::db::adapter::AnyAdapter::Sqlite($a) => $body,
            #[cfg(feature = "db2")]
            $crate::db::adapter::AnyAdapter::Db2($a) => $body,
        }
    };
}

pub use impl_adapter_dispatch;
