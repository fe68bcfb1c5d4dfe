//! Mapped types shared by the unit tests.
#![allow(dead_code)]

use crate::{
    error::UnsupportedReason,
    key::KeyOptions,
    model::spec::{EnumSpec, FamilySpec, RecordSpec, TypeSpec},
    traits::{EnumOrdinal, Mapped},
};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

///
/// Item
/// Auto-generated integer key.
///

#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct Item {
    pub id: i64,
    pub name: String,
    pub tags: Vec<String>,
}

impl Mapped for Item {
    fn type_spec() -> TypeSpec {
        RecordSpec::<Self>::new("Item")
            .key("Id", |i| &i.id, |i, v| i.id = v, KeyOptions::auto_generated())
            .field("Name", |i| &i.name, |i, v| i.name = v)
            .field("Tags", |i| &i.tags, |i, v| i.tags = v)
            .into()
    }
}

///
/// Order
/// Caller-supplied string key, nested records, enum, optional, timestamp.
///

#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct Order {
    pub code: String,
    pub placed: DateTime<Utc>,
    pub note: Option<String>,
    pub status: Status,
    pub lines: Vec<Line>,
    pub discount: f64,
    pub priority: u8,
    pub memo: String,
}

impl Mapped for Order {
    fn type_spec() -> TypeSpec {
        RecordSpec::<Self>::new("Order")
            .kind("orders")
            .key("code", |o| &o.code, |o, v| o.code = v, KeyOptions::manual())
            .field("placed", |o| &o.placed, |o, v| o.placed = v)
            .field("note", |o| &o.note, |o, v| o.note = v)
            .field("status", |o| &o.status, |o, v| o.status = v)
            .field("lines", |o| &o.lines, |o, v| o.lines = v)
            .field("discount", |o| &o.discount, |o, v| o.discount = v)
            .field("priority", |o| &o.priority, |o, v| o.priority = v)
            .unindexed("memo", |o| &o.memo, |o, v| o.memo = v)
            .into()
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct Line {
    pub sku: String,
    pub qty: i32,
}

impl Mapped for Line {
    fn type_spec() -> TypeSpec {
        RecordSpec::<Self>::new("Line")
            .field("sku", |l| &l.sku, |l, v| l.sku = v)
            .field("qty", |l| &l.qty, |l, v| l.qty = v)
            .into()
    }
}

///
/// Status
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub(crate) enum Status {
    #[default]
    Pending,
    Shipped,
    Cancelled,
}

impl EnumOrdinal for Status {
    fn ordinal(&self) -> i64 {
        match self {
            Self::Pending => 0,
            Self::Shipped => 1,
            Self::Cancelled => 2,
        }
    }

    fn from_ordinal(ordinal: i64) -> Option<Self> {
        match ordinal {
            0 => Some(Self::Pending),
            1 => Some(Self::Shipped),
            2 => Some(Self::Cancelled),
            _ => None,
        }
    }
}

impl Mapped for Status {
    fn type_spec() -> TypeSpec {
        EnumSpec::of::<Self>("Status").into()
    }
}

///
/// Figure
/// Named family with two members; `Circle` also declares its membership.
///

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Figure {
    Circle(Circle),
    Square(Square),
}

impl Mapped for Figure {
    fn type_spec() -> TypeSpec {
        FamilySpec::<Self>::named("Figure", "figure")
            .member(
                "circle",
                |f| match f {
                    Self::Circle(c) => Some(c),
                    Self::Square(_) => None,
                },
                Self::Circle,
            )
            .member(
                "square",
                |f| match f {
                    Self::Square(s) => Some(s),
                    Self::Circle(_) => None,
                },
                Self::Square,
            )
            .into()
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct Circle {
    pub radius: f64,
}

impl Mapped for Circle {
    fn type_spec() -> TypeSpec {
        RecordSpec::<Self>::new("Circle")
            .member_of::<Figure>()
            .field("radius", |c| &c.radius, |c, v| c.radius = v)
            .into()
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct Square {
    pub side: f64,
}

impl Mapped for Square {
    fn type_spec() -> TypeSpec {
        RecordSpec::<Self>::new("Square")
            .field("side", |s| &s.side, |s, v| s.side = v)
            .into()
    }
}

///
/// Drawing
/// Entity holding family values in a collection and an optional.
///

#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct Drawing {
    pub id: i64,
    pub title: String,
    pub figures: Vec<Figure>,
    pub focus: Option<Figure>,
}

impl Mapped for Drawing {
    fn type_spec() -> TypeSpec {
        RecordSpec::<Self>::new("Drawing")
            .key("id", |d| &d.id, |d, v| d.id = v, KeyOptions::auto_generated())
            .field("title", |d| &d.title, |d, v| d.title = v)
            .field("figures", |d| &d.figures, |d, v| d.figures = v)
            .field("focus", |d| &d.focus, |d, v| d.focus = v)
            .into()
    }
}

//
// Misconfigured types
//

#[derive(Clone, Debug, Default)]
pub(crate) struct NoKey {
    pub name: String,
}

impl Mapped for NoKey {
    fn type_spec() -> TypeSpec {
        RecordSpec::<Self>::new("NoKey")
            .field("name", |n| &n.name, |n, v| n.name = v)
            .into()
    }
}

#[derive(Clone, Debug, Default)]
pub(crate) struct TwoKeys {
    pub a: i64,
    pub b: i64,
}

impl Mapped for TwoKeys {
    fn type_spec() -> TypeSpec {
        RecordSpec::<Self>::new("TwoKeys")
            .key("a", |t| &t.a, |t, v| t.a = v, KeyOptions::manual())
            .key("b", |t| &t.b, |t, v| t.b = v, KeyOptions::manual())
            .into()
    }
}

#[derive(Clone, Debug, Default)]
pub(crate) struct WithMap {
    pub id: i64,
    pub lookup: BTreeMap<String, i64>,
}

impl Mapped for WithMap {
    fn type_spec() -> TypeSpec {
        RecordSpec::<Self>::new("WithMap")
            .key("id", |w| &w.id, |w, v| w.id = v, KeyOptions::manual())
            .field("lookup", |w| &w.lookup, |w, v| w.lookup = v)
            .into()
    }
}

pub(crate) struct NoConstructor {
    pub id: i64,
}

impl Mapped for NoConstructor {
    fn type_spec() -> TypeSpec {
        RecordSpec::<Self>::without_constructor("NoConstructor")
            .key("id", |n| &n.id, |n, v| n.id = v, KeyOptions::manual())
            .into()
    }
}

#[derive(Clone, Debug, Default)]
pub(crate) struct FloatKey {
    pub id: f64,
}

impl Mapped for FloatKey {
    fn type_spec() -> TypeSpec {
        RecordSpec::<Self>::new("FloatKey")
            .key("id", |f| &f.id, |f, v| f.id = v, KeyOptions::manual())
            .into()
    }
}

#[derive(Clone, Debug, Default)]
pub(crate) struct AutoNameKey {
    pub name: String,
}

impl Mapped for AutoNameKey {
    fn type_spec() -> TypeSpec {
        RecordSpec::<Self>::new("AutoNameKey")
            .key("name", |a| &a.name, |a, v| a.name = v, KeyOptions::auto_generated())
            .into()
    }
}

/// A family whose member is not a record.
pub(crate) enum Loose {
    Number(i64),
}

impl Mapped for Loose {
    fn type_spec() -> TypeSpec {
        FamilySpec::<Self>::new("Loose")
            .member("number", |l| match l {
                Self::Number(n) => Some(n),
            }, Self::Number)
            .into()
    }
}

/// A family that tags two members identically.
pub(crate) enum Twins {
    Left(Line),
    Right(Square),
}

impl Mapped for Twins {
    fn type_spec() -> TypeSpec {
        FamilySpec::<Self>::new("Twins")
            .member(
                "twin",
                |t| match t {
                    Self::Left(l) => Some(l),
                    Self::Right(_) => None,
                },
                Self::Left,
            )
            .member(
                "twin",
                |t| match t {
                    Self::Right(r) => Some(r),
                    Self::Left(_) => None,
                },
                Self::Right,
            )
            .into()
    }
}

/// A record that claims a family which does not list it.
#[derive(Clone, Debug, Default)]
pub(crate) struct Stray {
    pub side: f64,
}

impl Mapped for Stray {
    fn type_spec() -> TypeSpec {
        RecordSpec::<Self>::new("Stray")
            .member_of::<Figure>()
            .field("side", |s| &s.side, |s, v| s.side = v)
            .into()
    }
}

/// A type that declares itself unmappable.
pub(crate) struct Opaque;

impl Mapped for Opaque {
    fn type_spec() -> TypeSpec {
        TypeSpec::unsupported(UnsupportedReason::Declared("opaque handle".to_string()))
    }
}
