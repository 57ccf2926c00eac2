// ⚖️ BMI Engine - formula, category lookup and input validation
// Pure functions only: nothing here knows about storage or display.

use crate::error::{BmiError, Field, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// PLAUSIBLE INPUT BOUNDS
// ============================================================================

pub const MIN_WEIGHT_KG: f64 = 20.0;
pub const MAX_WEIGHT_KG: f64 = 300.0;
pub const MIN_HEIGHT_CM: f64 = 80.0;
pub const MAX_HEIGHT_CM: f64 = 250.0;

// ============================================================================
// CATEGORY
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Underweight,
    Normal,
    Overweight,
    Obese,
    Unknown,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Underweight => "Underweight",
            Category::Normal => "Normal",
            Category::Overweight => "Overweight",
            Category::Obese => "Obese",
            Category::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "Underweight" => Ok(Category::Underweight),
            "Normal" => Ok(Category::Normal),
            "Overweight" => Ok(Category::Overweight),
            "Obese" => Ok(Category::Obese),
            "Unknown" => Ok(Category::Unknown),
            other => Err(format!("unknown BMI category '{}'", other)),
        }
    }
}

/// Display color attached to a category, as `#RRGGBB`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorHint(pub &'static str);

impl ColorHint {
    pub const NEUTRAL: ColorHint = ColorHint("#FFFFFF");

    /// Red, green and blue components; neutral white if the hex is malformed.
    pub fn rgb(&self) -> (u8, u8, u8) {
        let hex = self.0.trim_start_matches('#');
        let channel = |i: usize| {
            hex.get(i..i + 2)
                .and_then(|c| u8::from_str_radix(c, 16).ok())
                .unwrap_or(0xFF)
        };
        (channel(0), channel(2), channel(4))
    }
}

/// One row of the classification table: `[low, high)`.
#[derive(Debug, Clone, Copy)]
pub struct CategoryRange {
    pub category: Category,
    pub low: f64,
    pub high: f64,
    pub color: ColorHint,
}

impl CategoryRange {
    pub fn contains(&self, bmi: f64) -> bool {
        self.low <= bmi && bmi < self.high
    }
}

/// Ascending, gap-free partition of [0, 100).
pub const CATEGORY_RANGES: [CategoryRange; 4] = [
    CategoryRange {
        category: Category::Underweight,
        low: 0.0,
        high: 18.5,
        color: ColorHint("#87CEEB"),
    },
    CategoryRange {
        category: Category::Normal,
        low: 18.5,
        high: 25.0,
        color: ColorHint("#90EE90"),
    },
    CategoryRange {
        category: Category::Overweight,
        low: 25.0,
        high: 30.0,
        color: ColorHint("#FFD700"),
    },
    CategoryRange {
        category: Category::Obese,
        low: 30.0,
        high: 100.0,
        color: ColorHint("#FF6347"),
    },
];

/// Color hint for an already-known category.
pub fn color_for(category: Category) -> ColorHint {
    CATEGORY_RANGES
        .iter()
        .find(|range| range.category == category)
        .map(|range| range.color)
        .unwrap_or(ColorHint::NEUTRAL)
}

// ============================================================================
// COMPUTATION
// ============================================================================

/// Enough fraction digits to print any f64 exactly.
const EXACT_FRACTION_DIGITS: usize = 1074;

/// Round to two decimal places.
///
/// Works on the exact binary value, not on `value * 100.0`: 15.625 stored as
/// 15.6249999... goes down, and a true tie such as 0.125 goes to the even
/// digit. The result is the f64 nearest the rounded decimal.
pub fn round2(value: f64) -> f64 {
    if !value.is_finite() {
        return value;
    }

    let exact = format!("{:.*}", EXACT_FRACTION_DIGITS, value.abs());
    let (whole, fraction) = exact.split_once('.').unwrap_or((exact.as_str(), "00"));
    let (kept, rest) = fraction.split_at(2);

    let mut digits: Vec<char> = whole.chars().chain(kept.chars()).collect();
    let round_up = match rest.as_bytes().first() {
        Some(b'5'..=b'9') if rest[1..].bytes().any(|d| d != b'0') => true,
        Some(b'6'..=b'9') => true,
        // Exact tie
        Some(b'5') => digits
            .last()
            .and_then(|d| d.to_digit(10))
            .is_some_and(|d| d % 2 == 1),
        _ => false,
    };

    if round_up {
        let mut i = digits.len();
        loop {
            if i == 0 {
                digits.insert(0, '1');
                break;
            }
            i -= 1;
            if digits[i] == '9' {
                digits[i] = '0';
            } else {
                digits[i] = char::from(digits[i] as u8 + 1);
                break;
            }
        }
    }

    let split = digits.len() - 2;
    let text: String = digits[..split]
        .iter()
        .chain(['.'].iter())
        .chain(digits[split..].iter())
        .collect();

    text.parse::<f64>().unwrap_or(value).copysign(value)
}

/// `weight / (height/100)^2`, rounded to two decimals.
///
/// Weight in kilograms, height in centimeters. Both must be finite and
/// strictly positive.
pub fn compute_bmi(weight: f64, height: f64) -> Result<f64> {
    if !weight.is_finite() || weight <= 0.0 {
        return Err(BmiError::invalid(
            Field::Weight,
            format!("{} is not a positive number", weight),
        ));
    }
    if !height.is_finite() || height <= 0.0 {
        return Err(BmiError::invalid(
            Field::Height,
            format!("{} is not a positive number", height),
        ));
    }

    let meters = height / 100.0;
    Ok(round2(weight / (meters * meters)))
}

/// First range containing `bmi`, or `Unknown` with a neutral color.
pub fn classify(bmi: f64) -> (Category, ColorHint) {
    CATEGORY_RANGES
        .iter()
        .find(|range| range.contains(bmi))
        .map(|range| (range.category, range.color))
        .unwrap_or((Category::Unknown, ColorHint::NEUTRAL))
}

// ============================================================================
// BOUNDARY VALIDATION
// ============================================================================

/// A username with a weight and height that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct Measurement {
    pub user: String,
    pub weight: f64,
    pub height: f64,
}

impl Measurement {
    pub fn bmi(&self) -> Result<f64> {
        compute_bmi(self.weight, self.height)
    }
}

pub fn parse_number(field: Field, text: &str) -> Result<f64> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(BmiError::invalid(field, format!("please enter a {}", field)));
    }

    let value: f64 = trimmed
        .parse()
        .map_err(|_| BmiError::invalid(field, format!("{} '{}' is not a number", field, trimmed)))?;

    if !value.is_finite() {
        return Err(BmiError::invalid(field, format!("{} '{}' is not a number", field, trimmed)));
    }

    Ok(value)
}

fn check_bounds(field: Field, value: f64, min: f64, max: f64) -> Result<()> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(BmiError::OutOfPlausibleRange { field, value })
    }
}

/// Validate raw form text in the order a user reads the form: username,
/// then weight, then height.
pub fn validate_measurement(user: &str, weight: &str, height: &str) -> Result<Measurement> {
    let user = user.trim();
    if user.is_empty() {
        return Err(BmiError::invalid(Field::Username, "please enter a username"));
    }

    let weight = parse_number(Field::Weight, weight)?;
    let height = parse_number(Field::Height, height)?;

    check_bounds(Field::Weight, weight, MIN_WEIGHT_KG, MAX_WEIGHT_KG)?;
    check_bounds(Field::Height, height, MIN_HEIGHT_CM, MAX_HEIGHT_CM)?;

    Ok(Measurement {
        user: user.to_string(),
        weight,
        height,
    })
}
