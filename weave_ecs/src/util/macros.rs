//! Variadic tuple-macro plumbing.
//!
//! Rust has no variadic generics, so every trait that needs to be implemented
//! for tuples of arbitrary arity (component sets, query data, system
//! parameters) is implemented by hand for `()`, `(A,)`, `(A, B)`, ... up to a
//! fixed arity via these two macros.

/// Recursively invoke `$m!` for every suffix of the given type list, e.g.
/// `for_every_tuple!(m !! A, B, C)` expands to `m!(A, B, C); m!(B, C); m!(C);`.
#[macro_export]
macro_rules! for_every_tuple {
    ($m:ident !! $head_ty:ident) => {
        $m!($head_ty);
    };
    ($m:ident !! $head_ty:ident, $($tail_ty:ident),*) => (
        $m!($head_ty, $( $tail_ty ),*);
        $crate::for_every_tuple!($m !! $( $tail_ty ),*);
    );
}

/// Apply a macro to all tuple arities from 1 to 16 elements.
///
/// 16 covers every system signature and query tuple seen in practice; systems
/// needing more parameters should group related ones into a struct.
#[macro_export]
macro_rules! all_tuples {
    ($m:ident) => {
        $crate::for_every_tuple!($m !! A, B, C, D, E, F, G, H, I, J, K, L, M, N, O, P);
    };
}
