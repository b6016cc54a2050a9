//! RF-code to marketing segment classification

use std::fmt;
use std::ops::RangeInclusive;

use crate::error::RfmError;

/// Named marketing segment
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Segment {
    Hibernating,
    AtRisk,
    CantLoose,
    AboutToSleep,
    NeedAttention,
    LoyalCustomers,
    Promising,
    NewCustomers,
    PotentialLoyalists,
    Champions,
}

impl Segment {
    pub const ALL: [Segment; 10] = [
        Segment::Hibernating,
        Segment::AtRisk,
        Segment::CantLoose,
        Segment::AboutToSleep,
        Segment::NeedAttention,
        Segment::LoyalCustomers,
        Segment::Promising,
        Segment::NewCustomers,
        Segment::PotentialLoyalists,
        Segment::Champions,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Segment::Hibernating => "hibernating",
            Segment::AtRisk => "at_risk",
            Segment::CantLoose => "cant_loose",
            Segment::AboutToSleep => "about_to_sleep",
            Segment::NeedAttention => "need_attention",
            Segment::LoyalCustomers => "loyal_customers",
            Segment::Promising => "promising",
            Segment::NewCustomers => "new_customers",
            Segment::PotentialLoyalists => "potential_loyalists",
            Segment::Champions => "champions",
        }
    }
}

impl Segment {
    /// Segment whose label is `label`, e.g. `"at_risk"`
    pub fn from_label(label: &str) -> Option<Segment> {
        Segment::ALL
            .into_iter()
            .find(|segment| segment.as_str() == label)
    }

    /// The rule assigning this segment
    pub fn rule(&self) -> Option<&'static SegmentRule> {
        SEGMENT_RULES.iter().find(|rule| rule.segment == *self)
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// One classification rule: a character class for each RF-code digit
#[derive(Debug, Clone)]
pub struct SegmentRule {
    /// Rule written as a regex over the code, shown in segment reports
    pub pattern: &'static str,
    pub recency: RangeInclusive<char>,
    pub frequency: RangeInclusive<char>,
    pub segment: Segment,
}

impl SegmentRule {
    const fn new(
        pattern: &'static str,
        recency: RangeInclusive<char>,
        frequency: RangeInclusive<char>,
        segment: Segment,
    ) -> Self {
        SegmentRule {
            pattern,
            recency,
            frequency,
            segment,
        }
    }

    /// Whether the whole two-character `code` matches this rule
    pub fn matches(&self, code: &str) -> bool {
        let mut chars = code.chars();
        match (chars.next(), chars.next(), chars.next()) {
            (Some(r), Some(f), None) => self.recency.contains(&r) && self.frequency.contains(&f),
            _ => false,
        }
    }
}

/// Classification rules in evaluation order
///
/// Rules may overlap in general, so order is part of the contract: the first
/// matching rule decides the segment.
pub static SEGMENT_RULES: [SegmentRule; 10] = [
    SegmentRule::new("[1-2][1-2]", '1'..='2', '1'..='2', Segment::Hibernating),
    SegmentRule::new("[1-2][3-4]", '1'..='2', '3'..='4', Segment::AtRisk),
    SegmentRule::new("[1-2]5", '1'..='2', '5'..='5', Segment::CantLoose),
    SegmentRule::new("3[1-2]", '3'..='3', '1'..='2', Segment::AboutToSleep),
    SegmentRule::new("33", '3'..='3', '3'..='3', Segment::NeedAttention),
    SegmentRule::new("[3-4][4-5]", '3'..='4', '4'..='5', Segment::LoyalCustomers),
    SegmentRule::new("41", '4'..='4', '1'..='1', Segment::Promising),
    SegmentRule::new("51", '5'..='5', '1'..='1', Segment::NewCustomers),
    SegmentRule::new("[4-5][2-3]", '4'..='5', '2'..='3', Segment::PotentialLoyalists),
    SegmentRule::new("5[4-5]", '5'..='5', '4'..='5', Segment::Champions),
];

/// First rule matching `code`
pub fn matching_rule(code: &str) -> Option<&'static SegmentRule> {
    SEGMENT_RULES.iter().find(|rule| rule.matches(code))
}

/// Classify an RF code such as `"54"`
///
/// A code no rule matches is a logic fault upstream and is reported, never
/// mapped to a fallback segment.
pub fn classify(code: &str) -> Result<Segment, RfmError> {
    matching_rule(code)
        .map(|rule| rule.segment)
        .ok_or_else(|| RfmError::UnmatchedSegment(code.to_string()))
}
