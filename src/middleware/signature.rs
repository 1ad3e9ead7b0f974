//! Stage descriptors.
//!
//! A [`Signature`] is built once, when a function is wrapped by
//! [`chainable`](crate::chainable) or [`terminal`](crate::terminal), and is
//! immutable after that. The arity impls in `stage.rs` know every parameter
//! and return type statically, so building one costs nothing per request —
//! it exists for the duplicate-type check and for diagnostics.

use std::any::{Any, TypeId};
use std::fmt;

use crate::error::Error;

/// Identity and display name of one parameter or return type.
///
/// `#[doc(hidden)] pub` rather than `pub(crate)` because it appears in the
/// hidden methods of the public `Outputs` and `StageFn` traits.
#[doc(hidden)]
#[derive(Clone, Copy, Debug)]
pub struct TypeSpec {
    id: TypeId,
    name: &'static str,
}

impl TypeSpec {
    pub(crate) fn of<T: Any>() -> Self {
        Self { id: TypeId::of::<T>(), name: std::any::type_name::<T>() }
    }
}

/// The inspected shape of a stage function: its ordered parameter types and
/// ordered return types.
#[derive(Clone, Debug)]
pub struct Signature {
    params: Vec<TypeSpec>,
    returns: Vec<TypeSpec>,
}

impl Signature {
    /// Validates and builds a descriptor for the stage named `stage`.
    ///
    /// Fails if the parameter list or the return list repeats a type. The
    /// same type appearing once in each list is fine — a stage may consume a
    /// value and publish a fresh one.
    pub(crate) fn validate(
        stage: &'static str,
        params: Vec<TypeSpec>,
        returns: Vec<TypeSpec>,
    ) -> Result<Self, Error> {
        if let Some(ty) = first_duplicate(&params) {
            return Err(Error::DuplicateParameter { stage, ty });
        }
        if let Some(ty) = first_duplicate(&returns) {
            return Err(Error::DuplicateReturn { stage, ty });
        }
        Ok(Self { params, returns })
    }
}

/// Returns the name of the first type that appears twice in `specs`.
///
/// Lists are a handful of entries at most; the quadratic scan beats building
/// a set.
fn first_duplicate(specs: &[TypeSpec]) -> Option<&'static str> {
    for (i, spec) in specs.iter().enumerate() {
        if specs[..i].iter().any(|earlier| earlier.id == spec.id) {
            return Some(spec.name);
        }
    }
    None
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let join = |specs: &[TypeSpec]| {
            specs.iter().map(|s| s.name).collect::<Vec<_>>().join(", ")
        };
        write!(f, "({}) -> ({})", join(&self.params), join(&self.returns))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone)]
    struct A;
    #[derive(Clone)]
    struct B;

    #[test]
    fn disjoint_types_validate() {
        let sig = Signature::validate(
            "stage",
            vec![TypeSpec::of::<A>(), TypeSpec::of::<B>()],
            vec![TypeSpec::of::<A>()],
        );
        assert!(sig.is_ok());
    }

    #[test]
    fn duplicate_parameter_type_is_rejected() {
        let err = Signature::validate(
            "stage",
            vec![TypeSpec::of::<A>(), TypeSpec::of::<B>(), TypeSpec::of::<A>()],
            vec![],
        )
        .unwrap_err();
        assert!(matches!(err, Error::DuplicateParameter { .. }));
    }

    #[test]
    fn duplicate_return_type_is_rejected() {
        let err = Signature::validate(
            "stage",
            vec![],
            vec![TypeSpec::of::<B>(), TypeSpec::of::<B>()],
        )
        .unwrap_err();
        assert!(matches!(err, Error::DuplicateReturn { .. }));
    }

    #[test]
    fn same_type_consumed_and_returned_is_fine() {
        let sig = Signature::validate(
            "stage",
            vec![TypeSpec::of::<A>()],
            vec![TypeSpec::of::<A>()],
        );
        assert!(sig.is_ok());
    }
}
