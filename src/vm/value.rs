//! The value lattice shared by concrete execution and abstract analysis.
//!
//! A [`Val`] approximates an R-style vector: a length range, an element
//! type, an optional pinned scalar constant, and a partial map of known
//! elements. Concrete runtime values are the fully pinned members of the
//! same lattice, so both interpreters speak one value language. Values are
//! immutable; `set_val` clones the container and shares untouched elements.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use super::error::VmError;

static BOTTOM: Lazy<Val> = Lazy::new(|| Val {
    range: Range::bot(),
    ty: Ty::Bot,
    constant: None,
    elems: BTreeMap::new(),
});

static TOP: Lazy<Val> = Lazy::new(|| Val {
    range: Range::top(),
    ty: Ty::Top,
    constant: None,
    elems: BTreeMap::new(),
});

/// Three-valued logic for predicates over approximate values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Truth {
    Yes,
    No,
    Maybe,
}

/// Possible element counts of a vector, as a half-open interval `[from, to)`.
///
/// `[0,1)` is a scalar, `[0,-1)` the unreachable Bottom, `[MIN,MAX)` the
/// unknown Top.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Range {
    pub from: i64,
    pub to: i64,
}

impl Range {
    pub fn bot() -> Range {
        Range { from: 0, to: -1 }
    }

    pub fn top() -> Range {
        Range {
            from: i64::MIN,
            to: i64::MAX,
        }
    }

    pub fn scalar() -> Range {
        Range { from: 0, to: 1 }
    }

    pub fn of_len(len: usize) -> Range {
        Range {
            from: 0,
            to: len as i64,
        }
    }

    pub fn is_bot(&self) -> bool {
        *self == Range::bot()
    }

    pub fn is_top(&self) -> bool {
        *self == Range::top()
    }

    /// Is the 0-based index `i` a valid element position?
    pub fn contains(&self, i: i64) -> Truth {
        if self.to == i64::MAX {
            return Truth::Maybe;
        }
        if self.is_bot() {
            return Truth::No;
        }
        if i >= self.from && i < self.to {
            Truth::Yes
        } else {
            Truth::No
        }
    }

    pub fn is_scalar(&self) -> Truth {
        if self.from == 0 && self.to == 1 {
            Truth::Yes
        } else if self.is_bot() {
            Truth::No
        } else if self.to == i64::MAX {
            Truth::Maybe
        } else {
            Truth::No
        }
    }

    /// Interval join.
    pub fn merge(&self, other: &Range) -> Range {
        if self.is_bot() {
            return *other;
        }
        if other.is_bot() {
            return *self;
        }
        Range {
            from: self.from.min(other.from),
            to: self.to.max(other.to),
        }
    }

    fn width(&self) -> i64 {
        self.to - self.from
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_top() {
            write!(f, "[T]")
        } else if self.is_bot() {
            write!(f, "[_]")
        } else {
            write!(f, "[{},{}]", self.from, self.to)
        }
    }
}

/// Element type of a vector. `Bot` is the merge identity, `Top` absorbs
/// any mismatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Ty {
    Bot,
    Num,
    Str,
    Top,
}

impl Ty {
    pub fn is_num(self) -> Truth {
        match self {
            Ty::Num => Truth::Yes,
            Ty::Top => Truth::Maybe,
            Ty::Bot | Ty::Str => Truth::No,
        }
    }

    pub fn is_str(self) -> Truth {
        match self {
            Ty::Str => Truth::Yes,
            Ty::Top => Truth::Maybe,
            Ty::Bot | Ty::Num => Truth::No,
        }
    }

    pub fn is_bot(self) -> bool {
        self == Ty::Bot
    }

    pub fn is_top(self) -> bool {
        self == Ty::Top
    }

    pub fn merge(self, other: Ty) -> Ty {
        match (self, other) {
            (Ty::Bot, t) | (t, Ty::Bot) => t,
            (Ty::Top, _) | (_, Ty::Top) => Ty::Top,
            (l, r) if l == r => l,
            _ => Ty::Top,
        }
    }
}

impl fmt::Display for Ty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Ty::Bot => "_",
            Ty::Top => "T",
            Ty::Num => "I",
            Ty::Str => "S",
        };
        f.write_str(s)
    }
}

/// A pinned scalar payload: the literal the lattice proves the value to be.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Const {
    Num(i64),
    Str(String),
}

/// An approximate vector value. See the module docs.
///
/// Element indices at the `get_val`/`set_val` surface are 1-based, the
/// surface language's convention; the internal element map is 0-based.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Val {
    range: Range,
    ty: Ty,
    constant: Option<Const>,
    elems: BTreeMap<usize, Arc<Val>>,
}

impl Val {
    /// The unreachable least element.
    pub fn bottom() -> Val {
        BOTTOM.clone()
    }

    /// The unknown greatest element.
    pub fn top() -> Val {
        TOP.clone()
    }

    /// A pinned scalar number.
    pub fn num(n: i64) -> Val {
        Val {
            range: Range::scalar(),
            ty: Ty::Num,
            constant: Some(Const::Num(n)),
            elems: BTreeMap::new(),
        }
    }

    /// A pinned scalar string.
    pub fn string(s: impl Into<String>) -> Val {
        Val {
            range: Range::scalar(),
            ty: Ty::Str,
            constant: Some(Const::Str(s.into())),
            elems: BTreeMap::new(),
        }
    }

    /// An unpinned scalar number: "some number, which one is unknown".
    pub fn any_num() -> Val {
        Val {
            range: Range::scalar(),
            ty: Ty::Num,
            constant: None,
            elems: BTreeMap::new(),
        }
    }

    fn unknown_of(ty: Ty) -> Val {
        Val {
            range: Range::top(),
            ty,
            constant: None,
            elems: BTreeMap::new(),
        }
    }

    fn scalar_of(ty: Ty) -> Val {
        Val {
            range: Range::scalar(),
            ty,
            constant: None,
            elems: BTreeMap::new(),
        }
    }

    /// Build a vector from its elements, the semantics of `c(...)`.
    /// The element type is taken from the first element; arrays cannot be
    /// empty by construction.
    pub fn from_vals(vals: Vec<Val>) -> Result<Val, VmError> {
        let first = vals.first().ok_or(VmError::EmptyArray)?;
        let mut out = Val {
            range: Range::of_len(vals.len()),
            ty: first.ty,
            constant: None,
            elems: BTreeMap::new(),
        };
        if out.is_scalar() == Truth::Yes {
            out.constant = first.constant.clone();
        } else {
            for (i, v) in vals.into_iter().enumerate() {
                out.elems.insert(i, Arc::new(v));
            }
        }
        Ok(out)
    }

    pub fn range(&self) -> Range {
        self.range
    }

    pub fn ty(&self) -> Ty {
        self.ty
    }

    pub fn is_bot(&self) -> bool {
        *self == *BOTTOM
    }

    pub fn is_top(&self) -> bool {
        *self == *TOP
    }

    pub fn is_scalar(&self) -> Truth {
        self.range.is_scalar()
    }

    pub fn is_num(&self) -> Truth {
        self.ty.is_num()
    }

    pub fn is_str(&self) -> Truth {
        self.ty.is_str()
    }

    /// The pinned number, when this is provably a scalar number constant.
    pub fn as_num(&self) -> Option<i64> {
        if self.is_scalar() != Truth::Yes {
            return None;
        }
        match &self.constant {
            Some(Const::Num(n)) => Some(*n),
            _ => None,
        }
    }

    /// The pinned string, when this is provably a scalar string constant.
    pub fn as_str(&self) -> Option<&str> {
        if self.is_scalar() != Truth::Yes {
            return None;
        }
        match &self.constant {
            Some(Const::Str(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Least upper bound of two values.
    ///
    /// Commutative, associative, idempotent; Bottom is the identity and Top
    /// absorbs. Equal constants survive, any disagreement erases them.
    /// Element maps union their keys; an element known on one side only is
    /// widened to an unknown-length value of its own type, so partial
    /// knowledge never silently disappears into Bottom.
    pub fn merge(&self, other: &Val) -> Val {
        if self.is_bot() {
            return other.clone();
        }
        if other.is_bot() {
            return self.clone();
        }
        if self.is_top() || other.is_top() {
            return Val::top();
        }
        let constant = match (&self.constant, &other.constant) {
            (Some(l), Some(r)) if l == r => Some(l.clone()),
            _ => None,
        };
        let mut elems = BTreeMap::new();
        for (k, l) in &self.elems {
            match other.elems.get(k) {
                Some(r) => {
                    elems.insert(*k, Arc::new(l.merge(r)));
                }
                None => {
                    elems.insert(*k, Arc::new(Val::unknown_of(l.ty)));
                }
            }
        }
        for (k, r) in &other.elems {
            if !self.elems.contains_key(k) {
                elems.insert(*k, Arc::new(Val::unknown_of(r.ty)));
            }
        }
        Val {
            range: self.range.merge(&other.range),
            ty: self.ty.merge(other.ty),
            constant,
            elems,
        }
    }

    /// Is this value free of approximation everywhere, so the concrete
    /// interpreter may hold it in a register?
    pub fn is_concrete(&self) -> bool {
        if self.is_bot()
            || self.is_top()
            || self.range.is_bot()
            || self.range.is_top()
            || self.ty.is_bot()
            || self.ty.is_top()
        {
            return false;
        }
        match self.is_scalar() {
            Truth::Yes => self.constant.is_some(),
            Truth::No => (0..self.range.to).all(|i| {
                self.elems
                    .get(&(i as usize))
                    .is_some_and(|v| v.is_concrete())
            }),
            Truth::Maybe => false,
        }
    }

    /// Indexing, the semantics of `get(vector, index)`. `index` is 1-based.
    ///
    /// An index provably out of range is a fatal bounds error; a `Maybe`
    /// membership widens to an unpinned scalar of the element type.
    pub fn get_val(&self, index: &Val) -> Result<Val, VmError> {
        if self.is_bot() || index.is_bot() {
            return Ok(Val::bottom());
        }
        if self.is_top() || index.is_top() {
            return Ok(Val::top());
        }
        match index.is_num() {
            Truth::No => return Ok(Val::bottom()),
            Truth::Maybe => return Ok(Val::top()),
            Truth::Yes => {}
        }
        match index.is_scalar() {
            Truth::No => return Ok(Val::bottom()),
            Truth::Maybe => return Ok(Val::top()),
            Truth::Yes => {}
        }
        let elem = match index.as_num() {
            // unpinned index: membership is undecidable
            None => return Ok(Val::scalar_of(self.ty)),
            Some(i) => i - 1,
        };
        match self.range.contains(elem) {
            Truth::Yes => {
                if self.is_scalar() == Truth::Yes {
                    return Ok(self.clone());
                }
                match self.elems.get(&(elem as usize)) {
                    Some(v) => Ok(v.as_ref().clone()),
                    None => Ok(Val::scalar_of(self.ty)),
                }
            }
            Truth::No => Err(VmError::IndexOutOfBounds {
                index: elem + 1,
                len: self.range.width(),
            }),
            Truth::Maybe => Ok(Val::scalar_of(self.ty)),
        }
    }

    /// Element replacement, the semantics of `set(vector, index, value)`.
    /// `index` is 1-based. Returns a new container; the receiver is unchanged.
    ///
    /// When the written position cannot be pinned the whole container
    /// widens to Top, since any element may have changed.
    pub fn set_val(&self, index: &Val, value: &Val) -> Result<Val, VmError> {
        if self.is_bot() || index.is_bot() {
            return Ok(Val::bottom());
        }
        match index.is_num() {
            Truth::No => return Ok(Val::bottom()),
            Truth::Maybe => return Ok(Val::top()),
            Truth::Yes => {}
        }
        if index.is_scalar() != Truth::Yes {
            return Ok(Val::unknown_of(self.ty));
        }
        let elem = match index.as_num() {
            // unpinned index: any element may have changed
            None => return Ok(Val::top()),
            Some(i) => i - 1,
        };
        match self.range.contains(elem) {
            Truth::Yes => {
                // a scalar is its own single element; the write replaces it
                if self.is_scalar() == Truth::Yes {
                    return Ok(value.clone());
                }
                let mut out = self.clone();
                out.elems.insert(elem as usize, Arc::new(value.clone()));
                Ok(out)
            }
            Truth::No => Err(VmError::IndexOutOfBounds {
                index: elem + 1,
                len: self.range.width(),
            }),
            Truth::Maybe => Ok(Val::top()),
        }
    }

    /// Element count, the semantics of `length(vector)`.
    pub fn size(&self) -> Val {
        if self.is_bot() || self.range.is_bot() {
            return Val::bottom();
        }
        if self.is_top() || self.range.is_top() {
            return Val::any_num();
        }
        Val::num(self.range.width())
    }

    /// The first element, used by branch guards. 1-based index 1.
    pub fn first(&self) -> Result<Val, VmError> {
        self.get_val(&Val::num(1))
    }

    fn numeric_binop(&self, rhs: &Val, op: impl Fn(i64, i64) -> i64) -> Val {
        if self.is_top() || rhs.is_top() {
            return Val::top();
        }
        if self.is_bot() || rhs.is_bot() {
            return Val::bottom();
        }
        if self.is_num() == Truth::No || rhs.is_num() == Truth::No {
            return Val::bottom();
        }
        if self.is_num() == Truth::Maybe || rhs.is_num() == Truth::Maybe {
            return Val::top();
        }
        if self.is_scalar() == Truth::No || rhs.is_scalar() == Truth::No {
            return Val::bottom();
        }
        if self.is_scalar() == Truth::Maybe || rhs.is_scalar() == Truth::Maybe {
            return Val::any_num();
        }
        match (self.as_num(), rhs.as_num()) {
            (Some(l), Some(r)) => Val::num(op(l, r)),
            _ => Val::any_num(),
        }
    }

    /// Scalar numeric addition; widens or propagates through the lattice.
    pub fn add(&self, rhs: &Val) -> Val {
        self.numeric_binop(rhs, |l, r| l.wrapping_add(r))
    }

    /// Scalar numeric subtraction; widens or propagates through the lattice.
    pub fn sub(&self, rhs: &Val) -> Val {
        self.numeric_binop(rhs, |l, r| l.wrapping_sub(r))
    }

    /// Three-valued scalar equality.
    pub fn eq_val(&self, rhs: &Val) -> Truth {
        if self.is_top() || rhs.is_top() {
            return Truth::Maybe;
        }
        if self.is_bot() || rhs.is_bot() {
            return Truth::No;
        }
        if self.is_num() == Truth::No || rhs.is_num() == Truth::No {
            return Truth::No;
        }
        if self.is_num() == Truth::Maybe || rhs.is_num() == Truth::Maybe {
            return Truth::Maybe;
        }
        if self.is_scalar() == Truth::No || rhs.is_scalar() == Truth::No {
            return Truth::No;
        }
        if self.is_scalar() == Truth::Maybe || rhs.is_scalar() == Truth::Maybe {
            return Truth::Maybe;
        }
        match (self.as_num(), rhs.as_num()) {
            (Some(l), Some(r)) => {
                if l == r {
                    Truth::Yes
                } else {
                    Truth::No
                }
            }
            _ => Truth::Maybe,
        }
    }
}

impl fmt::Display for Val {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_top() {
            return f.write_str("T");
        }
        if self.is_bot() {
            return f.write_str("_");
        }
        if self.is_scalar() == Truth::Yes {
            return match &self.constant {
                Some(Const::Num(n)) => write!(f, "{n}"),
                Some(Const::Str(s)) => f.write_str(s),
                None => write!(f, "{}", self.ty),
            };
        }
        f.write_str("c(")?;
        for i in 0..self.range.width() {
            if i > 0 {
                f.write_str(",")?;
            }
            match self.elems.get(&(i as usize)) {
                Some(v) => write!(f, "{v}")?,
                None => f.write_str("T")?,
            }
        }
        f.write_str(")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vec123() -> Val {
        Val::from_vals(vec![Val::num(1), Val::num(2), Val::num(3)]).unwrap()
    }

    fn samples() -> Vec<Val> {
        vec![
            Val::bottom(),
            Val::top(),
            Val::num(0),
            Val::num(5),
            Val::num(-3),
            Val::string("a"),
            Val::any_num(),
            vec123(),
            Val::from_vals(vec![Val::string("x"), Val::string("y")]).unwrap(),
        ]
    }

    #[test]
    fn test_merge_commutative() {
        for a in samples() {
            for b in samples() {
                assert_eq!(a.merge(&b), b.merge(&a), "merge({a}, {b})");
            }
        }
    }

    #[test]
    fn test_merge_associative() {
        for a in samples() {
            for b in samples() {
                for c in samples() {
                    assert_eq!(
                        a.merge(&b.merge(&c)),
                        a.merge(&b).merge(&c),
                        "merge({a}, {b}, {c})"
                    );
                }
            }
        }
    }

    #[test]
    fn test_merge_idempotent() {
        for a in samples() {
            assert_eq!(a.merge(&a), a, "merge({a}, {a})");
        }
    }

    #[test]
    fn test_merge_bottom_identity() {
        for a in samples() {
            assert_eq!(Val::bottom().merge(&a), a);
            assert_eq!(a.merge(&Val::bottom()), a);
        }
    }

    #[test]
    fn test_merge_top_absorbs() {
        for a in samples() {
            assert_eq!(Val::top().merge(&a), Val::top());
            assert_eq!(a.merge(&Val::top()), Val::top());
        }
    }

    #[test]
    fn test_merge_equal_constants_survive() {
        let m = Val::num(7).merge(&Val::num(7));
        assert_eq!(m, Val::num(7));
        assert_eq!(m.as_num(), Some(7));
    }

    #[test]
    fn test_merge_disagreeing_constants_erase() {
        let m = Val::num(1).merge(&Val::num(2));
        assert_eq!(m, Val::any_num());
        assert_eq!(m.as_num(), None);
        assert_eq!(m.is_num(), Truth::Yes);
        assert_eq!(m.is_scalar(), Truth::Yes);
    }

    #[test]
    fn test_merge_num_with_str_widens_type() {
        let m = Val::num(1).merge(&Val::string("a"));
        assert_eq!(m.ty(), Ty::Top);
        assert_eq!(m.is_num(), Truth::Maybe);
    }

    #[test]
    fn test_merge_unions_element_maps() {
        let short = Val::from_vals(vec![Val::num(1), Val::num(2)]).unwrap();
        let long = vec123();
        let m = short.merge(&long);
        assert_eq!(m.range(), Range { from: 0, to: 3 });
        // shared indices merge, the extra index widens to unknown length
        assert_eq!(m.get_val(&Val::num(1)).unwrap(), Val::num(1));
        let third = m.get_val(&Val::num(3)).unwrap();
        assert_eq!(third.as_num(), None);
        assert_eq!(third.ty(), Ty::Num);
    }

    #[test]
    fn test_three_valued_on_bottom() {
        let b = Val::bottom();
        assert_eq!(b.is_scalar(), Truth::No);
        assert_eq!(b.is_num(), Truth::No);
        assert_eq!(b.is_str(), Truth::No);
        assert_eq!(b.eq_val(&Val::num(1)), Truth::No);
    }

    #[test]
    fn test_three_valued_on_top() {
        let t = Val::top();
        assert_eq!(t.is_scalar(), Truth::Maybe);
        assert_eq!(t.is_num(), Truth::Maybe);
        assert_eq!(t.is_str(), Truth::Maybe);
        assert_eq!(t.eq_val(&Val::num(1)), Truth::Maybe);
    }

    #[test]
    fn test_eq_on_constants() {
        assert_eq!(Val::num(5).eq_val(&Val::num(5)), Truth::Yes);
        assert_eq!(Val::num(5).eq_val(&Val::num(6)), Truth::No);
        assert_eq!(Val::any_num().eq_val(&Val::num(0)), Truth::Maybe);
        assert_eq!(Val::string("a").eq_val(&Val::num(5)), Truth::No);
    }

    #[test]
    fn test_get_is_one_based() {
        let v = vec123();
        assert_eq!(v.get_val(&Val::num(1)).unwrap(), Val::num(1));
        assert_eq!(v.get_val(&Val::num(2)).unwrap(), Val::num(2));
        assert_eq!(v.get_val(&Val::num(3)).unwrap(), Val::num(3));
    }

    #[test]
    fn test_get_out_of_bounds_is_fatal() {
        let v = vec123();
        assert_eq!(
            v.get_val(&Val::num(5)),
            Err(VmError::IndexOutOfBounds { index: 5, len: 3 })
        );
        assert_eq!(
            v.get_val(&Val::num(0)),
            Err(VmError::IndexOutOfBounds { index: 0, len: 3 })
        );
    }

    #[test]
    fn test_get_on_scalar_returns_itself() {
        assert_eq!(Val::num(9).get_val(&Val::num(1)).unwrap(), Val::num(9));
    }

    #[test]
    fn test_get_with_unpinned_index_widens() {
        let got = vec123().get_val(&Val::any_num()).unwrap();
        assert_eq!(got, Val::any_num());
    }

    #[test]
    fn test_get_with_non_numeric_index_is_bottom() {
        assert!(vec123().get_val(&Val::string("x")).unwrap().is_bot());
    }

    #[test]
    fn test_get_propagates_top_and_bottom() {
        assert!(vec123().get_val(&Val::top()).unwrap().is_top());
        assert!(vec123().get_val(&Val::bottom()).unwrap().is_bot());
        assert!(Val::top().get_val(&Val::num(1)).unwrap().is_top());
        assert!(Val::bottom().get_val(&Val::num(1)).unwrap().is_bot());
    }

    #[test]
    fn test_set_replaces_one_element() {
        let v = vec123();
        let w = v.set_val(&Val::num(2), &Val::num(9)).unwrap();
        assert_eq!(w.get_val(&Val::num(2)).unwrap(), Val::num(9));
        assert_eq!(w.get_val(&Val::num(1)).unwrap(), Val::num(1));
        // the original container is untouched
        assert_eq!(v.get_val(&Val::num(2)).unwrap(), Val::num(2));
    }

    #[test]
    fn test_set_on_scalar_replaces_the_value() {
        let w = Val::num(5).set_val(&Val::num(1), &Val::num(9)).unwrap();
        assert_eq!(w, Val::num(9));
        assert_eq!(w.get_val(&Val::num(1)).unwrap(), Val::num(9));
        assert_eq!(w.eq_val(&Val::num(9)), Truth::Yes);
        let s = Val::string("a")
            .set_val(&Val::num(1), &Val::string("b"))
            .unwrap();
        assert_eq!(s, Val::string("b"));
    }

    #[test]
    fn test_set_on_scalar_with_unpinned_value_widens() {
        let w = Val::num(5).set_val(&Val::num(1), &Val::any_num()).unwrap();
        assert_eq!(w, Val::any_num());
        assert!(!w.is_concrete());
    }

    #[test]
    fn test_set_out_of_bounds_is_fatal() {
        assert_eq!(
            vec123().set_val(&Val::num(4), &Val::num(0)),
            Err(VmError::IndexOutOfBounds { index: 4, len: 3 })
        );
    }

    #[test]
    fn test_set_with_unpinned_index_is_top() {
        assert!(vec123()
            .set_val(&Val::any_num(), &Val::num(0))
            .unwrap()
            .is_top());
    }

    #[test]
    fn test_size() {
        assert_eq!(vec123().size(), Val::num(3));
        assert_eq!(Val::num(7).size(), Val::num(1));
        assert!(Val::bottom().size().is_bot());
        assert_eq!(Val::top().size(), Val::any_num());
    }

    #[test]
    fn test_add_sub_constant_folding() {
        assert_eq!(Val::num(2).add(&Val::num(3)), Val::num(5));
        assert_eq!(Val::num(2).sub(&Val::num(3)), Val::num(-1));
    }

    #[test]
    fn test_add_widens_on_unpinned_operand() {
        assert_eq!(Val::num(2).add(&Val::any_num()), Val::any_num());
    }

    #[test]
    fn test_add_propagation() {
        assert!(Val::num(1).add(&Val::top()).is_top());
        assert!(Val::num(1).add(&Val::bottom()).is_bot());
        assert!(Val::num(1).add(&Val::string("a")).is_bot());
        assert!(Val::num(1).add(&vec123()).is_bot());
    }

    #[test]
    fn test_from_vals_empty_is_error() {
        assert_eq!(Val::from_vals(vec![]), Err(VmError::EmptyArray));
    }

    #[test]
    fn test_from_vals_single_element_pins_constant() {
        assert_eq!(Val::from_vals(vec![Val::num(4)]).unwrap(), Val::num(4));
        assert_eq!(
            Val::from_vals(vec![Val::string("a")]).unwrap(),
            Val::string("a")
        );
    }

    #[test]
    fn test_is_concrete() {
        assert!(Val::num(1).is_concrete());
        assert!(Val::string("a").is_concrete());
        assert!(vec123().is_concrete());
        assert!(!Val::any_num().is_concrete());
        assert!(!Val::bottom().is_concrete());
        assert!(!Val::top().is_concrete());
        let widened = vec123().merge(&Val::from_vals(vec![Val::num(1)]).unwrap());
        assert!(!widened.is_concrete());
    }

    #[test]
    fn test_first() {
        assert_eq!(vec123().first().unwrap(), Val::num(1));
        assert_eq!(Val::num(8).first().unwrap(), Val::num(8));
    }

    #[test]
    fn test_display() {
        assert_eq!(Val::top().to_string(), "T");
        assert_eq!(Val::bottom().to_string(), "_");
        assert_eq!(Val::num(42).to_string(), "42");
        assert_eq!(Val::string("hi").to_string(), "hi");
        assert_eq!(Val::any_num().to_string(), "I");
        assert_eq!(vec123().to_string(), "c(1,2,3)");
    }

    #[test]
    fn test_json_round_trip() {
        for v in samples() {
            let json = serde_json::to_string(&v).unwrap();
            let back: Val = serde_json::from_str(&json).unwrap();
            assert_eq!(back, v, "{json}");
        }
    }
}
