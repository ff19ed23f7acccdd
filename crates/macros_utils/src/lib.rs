//! Small declarative helpers shared by the binaries.

#[cfg(feature = "actix")]
#[doc(hidden)]
pub use actix_web;

/// Generate a `routes` function registering actix services.
///
/// `route name` registers a handler generated by an actix route macro,
/// `mod name` pulls in the `routes` function of a child module.
///
/// ```ignore
/// macros_utils::routes! {
///     mod health,
///     route check_node_route,
/// }
/// ```
#[cfg(feature = "actix")]
#[macro_export]
macro_rules! routes {
    ($($entries:tt)*) => {
        pub fn routes(cfg: &mut $crate::actix_web::web::ServiceConfig) {
            $crate::__route_entries!(cfg; $($entries)*);
        }
    };
}

#[cfg(feature = "actix")]
#[doc(hidden)]
#[macro_export]
macro_rules! __route_entries {
    ($cfg:ident;) => {};
    ($cfg:ident; route $handler:ident $(, $($rest:tt)*)?) => {
        $cfg.service($handler);
        $crate::__route_entries!($cfg; $($($rest)*)?);
    };
    ($cfg:ident; mod $module:ident $(, $($rest:tt)*)?) => {
        $cfg.configure($module::routes);
        $crate::__route_entries!($cfg; $($($rest)*)?);
    };
}
