// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Kinship vocabulary: relation codes, their inverses, and display labels.
//!
//! Relation codes are gender-neutral. Gender only matters when a code is
//! turned into a label for a specific person ("parent" -> "Father").
//! Codes outside the known set are carried through untouched: they are
//! their own inverse and their own label.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::user::Gender;

/// Canonical kinship category.
///
/// The stored code always describes the member from the family creator's
/// point of view ("this member is my child").
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RelationCode {
    Parent,
    Child,
    Sibling,
    Spouse,
    Grandparent,
    Grandchild,
    /// Any code not in the vocabulary, kept verbatim.
    Other(String),
}

impl RelationCode {
    /// All known codes, in display order.
    pub const KNOWN: [RelationCode; 6] = [
        RelationCode::Parent,
        RelationCode::Child,
        RelationCode::Sibling,
        RelationCode::Spouse,
        RelationCode::Grandparent,
        RelationCode::Grandchild,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            RelationCode::Parent => "parent",
            RelationCode::Child => "child",
            RelationCode::Sibling => "sibling",
            RelationCode::Spouse => "spouse",
            RelationCode::Grandparent => "grandparent",
            RelationCode::Grandchild => "grandchild",
            RelationCode::Other(code) => code,
        }
    }

    /// The code for the reciprocal direction of the pair.
    pub fn inverse(&self) -> RelationCode {
        match self {
            RelationCode::Parent => RelationCode::Child,
            RelationCode::Child => RelationCode::Parent,
            RelationCode::Grandparent => RelationCode::Grandchild,
            RelationCode::Grandchild => RelationCode::Grandparent,
            RelationCode::Sibling => RelationCode::Sibling,
            RelationCode::Spouse => RelationCode::Spouse,
            RelationCode::Other(code) => RelationCode::Other(code.clone()),
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, RelationCode::Other(_))
    }
}

impl From<String> for RelationCode {
    fn from(value: String) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "parent" => RelationCode::Parent,
            "child" => RelationCode::Child,
            "sibling" => RelationCode::Sibling,
            "spouse" => RelationCode::Spouse,
            "grandparent" => RelationCode::Grandparent,
            "grandchild" => RelationCode::Grandchild,
            _ => RelationCode::Other(value),
        }
    }
}

impl From<&str> for RelationCode {
    fn from(value: &str) -> Self {
        RelationCode::from(value.to_string())
    }
}

impl From<RelationCode> for String {
    fn from(code: RelationCode) -> Self {
        match code {
            RelationCode::Other(code) => code,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for RelationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Display language for relation labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    En,
    #[default]
    Es,
}

impl FromStr for Locale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "en" | "en-us" | "en-gb" => Ok(Locale::En),
            "es" | "es-es" | "es-mx" => Ok(Locale::Es),
            other => Err(format!("unsupported locale: {other}")),
        }
    }
}

/// Label triple for one code: (male, female, neutral).
type Labels = (&'static str, &'static str, &'static str);

fn labels(code: &RelationCode, locale: Locale) -> Option<Labels> {
    let labels = match (locale, code) {
        (Locale::En, RelationCode::Parent) => ("Father", "Mother", "Parent"),
        (Locale::En, RelationCode::Child) => ("Son", "Daughter", "Child"),
        (Locale::En, RelationCode::Sibling) => ("Brother", "Sister", "Sibling"),
        (Locale::En, RelationCode::Spouse) => ("Husband", "Wife", "Spouse"),
        (Locale::En, RelationCode::Grandparent) => ("Grandfather", "Grandmother", "Grandparent"),
        (Locale::En, RelationCode::Grandchild) => ("Grandson", "Granddaughter", "Grandchild"),
        (Locale::Es, RelationCode::Parent) => ("Padre", "Madre", "Padre/Madre"),
        (Locale::Es, RelationCode::Child) => ("Hijo", "Hija", "Hijo/Hija"),
        (Locale::Es, RelationCode::Sibling) => ("Hermano", "Hermana", "Hermano/Hermana"),
        (Locale::Es, RelationCode::Spouse) => ("Esposo", "Esposa", "Cónyuge"),
        (Locale::Es, RelationCode::Grandparent) => ("Abuelo", "Abuela", "Abuelo/Abuela"),
        (Locale::Es, RelationCode::Grandchild) => ("Nieto", "Nieta", "Nieto/Nieta"),
        (_, RelationCode::Other(_)) => return None,
    };
    Some(labels)
}

/// Display label for `code` describing a person of `gender`.
pub fn relation_label(code: &RelationCode, gender: Gender, locale: Locale) -> String {
    match labels(code, locale) {
        Some((male, female, neutral)) => match gender {
            Gender::Male => male,
            Gender::Female => female,
            Gender::Other | Gender::Neutral => neutral,
        }
        .to_string(),
        None => code.as_str().to_string(),
    }
}

/// Inverse code for a pair whose reciprocal party has `gender`.
///
/// Codes carry no gender, so only `code` determines the result; pair it
/// with [`relation_label`] to get the gendered display form.
pub fn inverse_relation(code: &RelationCode, _gender: Gender) -> RelationCode {
    code.inverse()
}
