//! Unit conversion catalog
//!
//! Every unit belongs to exactly one family and carries a fixed factor relative
//! to the family's smallest unit. Converting between two units of the same
//! family is a single multiply/divide by those exact ratios; converting across
//! families is undefined and yields 0.

use serde::{Deserialize, Serialize};

/// Convertible quantity families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnitFamily {
    ImperialLength,
    MetricLength,
    ImperialWeight,
    MetricWeight,
    Time,
    ImperialCapacity,
    MetricCapacity,
}

/// Distractor multipliers for families that do not step in powers of ten
pub const NON_DECIMAL_MULTIPLIERS: [f64; 7] = [3.0, 6.0, 12.0, 16.0, 24.0, 30.0, 60.0];
/// Distractor multipliers for metric families
pub const DECIMAL_MULTIPLIERS: [f64; 7] = [0.1, 1.0, 10.0, 100.0, 1000.0, 10000.0, 100000.0];

impl UnitFamily {
    pub const ALL: [UnitFamily; 7] = [
        UnitFamily::ImperialLength,
        UnitFamily::MetricLength,
        UnitFamily::ImperialWeight,
        UnitFamily::MetricWeight,
        UnitFamily::Time,
        UnitFamily::ImperialCapacity,
        UnitFamily::MetricCapacity,
    ];

    pub fn is_metric(&self) -> bool {
        matches!(
            self,
            UnitFamily::MetricLength | UnitFamily::MetricWeight | UnitFamily::MetricCapacity
        )
    }

    /// Whether question inputs may carry decimals (imperial and time are whole numbers)
    pub fn allows_decimals(&self) -> bool {
        self.is_metric()
    }

    /// Multiplier set used to build plausible wrong answers
    pub fn distractor_multipliers(&self) -> &'static [f64; 7] {
        if self.is_metric() {
            &DECIMAL_MULTIPLIERS
        } else {
            &NON_DECIMAL_MULTIPLIERS
        }
    }

    /// Units belonging to this family, smallest first
    pub fn units(&self) -> &'static [Unit] {
        use Unit::*;
        match self {
            UnitFamily::ImperialLength => &[Inch, Foot, Yard, Mile],
            UnitFamily::MetricLength => &[Millimeter, Centimeter, Meter, Kilometer],
            UnitFamily::ImperialWeight => &[Ounce, Pound, Ton],
            UnitFamily::MetricWeight => &[Milligram, Gram, Kilogram],
            UnitFamily::Time => &[Second, Minute, Hour, Day, Week],
            UnitFamily::ImperialCapacity => &[FluidOunce, Cup, Pint, Quart, Gallon],
            UnitFamily::MetricCapacity => &[Milliliter, Liter, Kiloliter],
        }
    }
}

/// Individual units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Unit {
    Inch,
    Foot,
    Yard,
    Mile,
    Millimeter,
    Centimeter,
    Meter,
    Kilometer,
    Ounce,
    Pound,
    Ton,
    Milligram,
    Gram,
    Kilogram,
    Second,
    Minute,
    Hour,
    Day,
    Week,
    FluidOunce,
    Cup,
    Pint,
    Quart,
    Gallon,
    Milliliter,
    Liter,
    Kiloliter,
}

impl Unit {
    pub fn family(&self) -> UnitFamily {
        use Unit::*;
        match self {
            Inch | Foot | Yard | Mile => UnitFamily::ImperialLength,
            Millimeter | Centimeter | Meter | Kilometer => UnitFamily::MetricLength,
            Ounce | Pound | Ton => UnitFamily::ImperialWeight,
            Milligram | Gram | Kilogram => UnitFamily::MetricWeight,
            Second | Minute | Hour | Day | Week => UnitFamily::Time,
            FluidOunce | Cup | Pint | Quart | Gallon => UnitFamily::ImperialCapacity,
            Milliliter | Liter | Kiloliter => UnitFamily::MetricCapacity,
        }
    }

    /// Size of this unit expressed in its family's smallest unit
    fn base_factor(&self) -> f64 {
        use Unit::*;
        match self {
            Inch => 1.0,
            Foot => 12.0,
            Yard => 36.0,
            Mile => 63_360.0,
            Millimeter => 1.0,
            Centimeter => 10.0,
            Meter => 1_000.0,
            Kilometer => 1_000_000.0,
            Ounce => 1.0,
            Pound => 16.0,
            Ton => 32_000.0,
            Milligram => 1.0,
            Gram => 1_000.0,
            Kilogram => 1_000_000.0,
            Second => 1.0,
            Minute => 60.0,
            Hour => 3_600.0,
            Day => 86_400.0,
            Week => 604_800.0,
            FluidOunce => 1.0,
            Cup => 8.0,
            Pint => 16.0,
            Quart => 32.0,
            Gallon => 128.0,
            Milliliter => 1.0,
            Liter => 1_000.0,
            Kiloliter => 1_000_000.0,
        }
    }

    pub fn abbreviation(&self) -> &'static str {
        use Unit::*;
        match self {
            Inch => "in",
            Foot => "ft",
            Yard => "yd",
            Mile => "mi",
            Millimeter => "mm",
            Centimeter => "cm",
            Meter => "m",
            Kilometer => "km",
            Ounce => "oz",
            Pound => "lb",
            Ton => "ton",
            Milligram => "mg",
            Gram => "g",
            Kilogram => "kg",
            Second => "s",
            Minute => "min",
            Hour => "h",
            Day => "d",
            Week => "wk",
            FluidOunce => "fl oz",
            Cup => "c",
            Pint => "pt",
            Quart => "qt",
            Gallon => "gal",
            Milliliter => "mL",
            Liter => "L",
            Kiloliter => "kL",
        }
    }
}

/// Convert `value` from one unit to another.
///
/// Returns 0 when the units belong to different families.
pub fn convert(value: f64, from: Unit, to: Unit) -> f64 {
    if from.family() != to.family() {
        return 0.0;
    }
    if from == to {
        return value;
    }
    let (f, t) = (from.base_factor(), to.base_factor());
    // Multiply before dividing when growing so whole ratios stay exact
    if f >= t {
        value * (f / t)
    } else {
        value / (t / f)
    }
}

/// Factor that turns one `from` into `to` (`convert(1, from, to)`)
pub fn multiplier(from: Unit, to: Unit) -> f64 {
    convert(1.0, from, to)
}

/// A catalog entry: which units a question converts between
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionTemplate {
    pub from: Unit,
    pub to: Unit,
}

impl ConversionTemplate {
    pub const fn new(from: Unit, to: Unit) -> Self {
        Self { from, to }
    }

    pub fn family(&self) -> UnitFamily {
        self.from.family()
    }

    /// Instantiate a conversion with a concrete input value
    pub fn instantiate(&self, input: f64) -> Conversion {
        Conversion {
            family: self.family(),
            input,
            from: self.from,
            to: self.to,
        }
    }
}

/// A concrete conversion question owned by one meteor
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Conversion {
    pub family: UnitFamily,
    pub input: f64,
    pub from: Unit,
    pub to: Unit,
}

impl Conversion {
    /// The correct converted value
    pub fn output(&self) -> f64 {
        convert(self.input, self.from, self.to)
    }

    pub fn multiplier(&self) -> f64 {
        multiplier(self.from, self.to)
    }
}

/// Every question the game can ask
pub const CATALOG: &[ConversionTemplate] = &[
    ConversionTemplate::new(Unit::Foot, Unit::Inch),
    ConversionTemplate::new(Unit::Yard, Unit::Foot),
    ConversionTemplate::new(Unit::Yard, Unit::Inch),
    ConversionTemplate::new(Unit::Mile, Unit::Yard),
    ConversionTemplate::new(Unit::Inch, Unit::Foot),
    ConversionTemplate::new(Unit::Meter, Unit::Centimeter),
    ConversionTemplate::new(Unit::Kilometer, Unit::Meter),
    ConversionTemplate::new(Unit::Centimeter, Unit::Millimeter),
    ConversionTemplate::new(Unit::Meter, Unit::Millimeter),
    ConversionTemplate::new(Unit::Millimeter, Unit::Centimeter),
    ConversionTemplate::new(Unit::Centimeter, Unit::Meter),
    ConversionTemplate::new(Unit::Pound, Unit::Ounce),
    ConversionTemplate::new(Unit::Ton, Unit::Pound),
    ConversionTemplate::new(Unit::Kilogram, Unit::Gram),
    ConversionTemplate::new(Unit::Gram, Unit::Milligram),
    ConversionTemplate::new(Unit::Gram, Unit::Kilogram),
    ConversionTemplate::new(Unit::Minute, Unit::Second),
    ConversionTemplate::new(Unit::Hour, Unit::Minute),
    ConversionTemplate::new(Unit::Day, Unit::Hour),
    ConversionTemplate::new(Unit::Hour, Unit::Second),
    ConversionTemplate::new(Unit::Week, Unit::Day),
    ConversionTemplate::new(Unit::Gallon, Unit::Quart),
    ConversionTemplate::new(Unit::Quart, Unit::Pint),
    ConversionTemplate::new(Unit::Pint, Unit::Cup),
    ConversionTemplate::new(Unit::Cup, Unit::FluidOunce),
    ConversionTemplate::new(Unit::Liter, Unit::Milliliter),
    ConversionTemplate::new(Unit::Kiloliter, Unit::Liter),
    ConversionTemplate::new(Unit::Milliliter, Unit::Liter),
];

/// Catalog entries restricted to the given families
pub fn templates_for(families: &[UnitFamily]) -> Vec<ConversionTemplate> {
    CATALOG
        .iter()
        .filter(|t| families.contains(&t.family()))
        .copied()
        .collect()
}
