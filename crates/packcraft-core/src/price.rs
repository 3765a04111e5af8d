//! Deterministic price quotes from base price, size, material and quantity.

use crate::error::PriceError;
use serde::{Deserialize, Serialize};

/// Bulk discount that applies from `min_quantity` units upward.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscountTier {
    pub min_quantity: u32,
    /// Fraction taken off the subtotal, 0..=1.
    pub rate: f64,
}

fn default_tiers() -> Vec<DiscountTier> {
    vec![
        DiscountTier {
            min_quantity: 1000,
            rate: 0.20,
        },
        DiscountTier {
            min_quantity: 500,
            rate: 0.10,
        },
    ]
}

fn default_area_rate() -> f64 {
    0.001
}

fn default_minor_unit() -> u32 {
    2
}

/// Business rules applied by [`quote`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingRules {
    #[serde(default = "default_tiers")]
    pub tiers: Vec<DiscountTier>,
    /// Surcharge per square unit when a size only carries dimensions.
    #[serde(default = "default_area_rate")]
    pub area_rate: f64,
    /// Decimal places of the currency's minor unit (2 for cents).
    #[serde(default = "default_minor_unit")]
    pub currency_minor_unit: u32,
}

impl Default for PricingRules {
    fn default() -> Self {
        Self {
            tiers: default_tiers(),
            area_rate: default_area_rate(),
            currency_minor_unit: default_minor_unit(),
        }
    }
}

impl PricingRules {
    /// The single tier with the highest threshold not above `quantity`.
    pub fn best_tier(&self, quantity: u32) -> Option<&DiscountTier> {
        self.tiers
            .iter()
            .filter(|t| t.min_quantity <= quantity)
            .max_by_key(|t| t.min_quantity)
    }

    fn validate(&self) -> Result<(), PriceError> {
        if let Some(tier) = self.tiers.iter().find(|t| !(0.0..=1.0).contains(&t.rate)) {
            return Err(PriceError::InvalidInput(format!(
                "discount rate {} for {}+ units outside 0..=1",
                tier.rate, tier.min_quantity
            )));
        }
        finite_non_negative("areaRate", self.area_rate)
    }
}

/// Selected size. An explicit `price` delta wins over dimensions.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SizeOption {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
}

/// Selected material. A multiplicative `price_factor` wins over a `price` delta.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterialOption {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_factor: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
}

/// `{ basePrice, size?, material?, quantity }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceRequest {
    pub base_price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<SizeOption>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material: Option<MaterialOption>,
    pub quantity: u32,
}

impl PriceRequest {
    pub fn new(base_price: f64, quantity: u32) -> Self {
        Self {
            base_price,
            size: None,
            material: None,
            quantity,
        }
    }

    pub fn with_size(mut self, size: SizeOption) -> Self {
        self.size = Some(size);
        self
    }

    pub fn with_material(mut self, material: MaterialOption) -> Self {
        self.material = Some(material);
        self
    }
}

/// Computed quote. `amount` is rounded to the currency minor unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceQuote {
    pub amount: f64,
    pub currency_minor_unit: u32,
    /// Price of one unit after size and material, before discount.
    pub unit_price: f64,
    /// `unit_price * quantity`.
    pub subtotal: f64,
    pub discount_rate: f64,
    pub quantity: u32,
}

fn finite_non_negative(name: &str, value: f64) -> Result<(), PriceError> {
    if !value.is_finite() || value < 0.0 {
        return Err(PriceError::InvalidInput(format!("{name} must be finite and non-negative, got {value}")));
    }
    Ok(())
}

fn finite(name: &str, value: f64) -> Result<(), PriceError> {
    if !value.is_finite() {
        return Err(PriceError::InvalidInput(format!("{name} must be finite")));
    }
    Ok(())
}

/// Half-up rounding to the minor unit. The scaled value is first settled at
/// six extra digits so decimal halves like 1.005 (stored as 1.00499...) round up.
fn round_to_minor_unit(value: f64, minor_unit: u32) -> f64 {
    let factor = 10f64.powi(minor_unit.min(9) as i32);
    let scaled = ((value * factor) * 1e6).round() / 1e6;
    scaled.round() / factor
}

/// Compute a quote. Pure: identical inputs always give an identical quote.
///
/// Steps run in a fixed order: base price, size delta (or area surcharge),
/// material factor (or delta), quantity, single best tier discount, rounding.
pub fn quote(request: &PriceRequest, rules: &PricingRules) -> Result<PriceQuote, PriceError> {
    rules.validate()?;
    finite_non_negative("basePrice", request.base_price)?;
    if request.quantity == 0 {
        return Err(PriceError::InvalidInput("quantity must be at least 1".to_string()));
    }

    let mut unit = request.base_price;

    if let Some(size) = &request.size {
        if let Some(delta) = size.price {
            finite("size.price", delta)?;
            unit += delta;
        } else if let (Some(w), Some(h)) = (size.width, size.height) {
            finite_non_negative("size.width", w)?;
            finite_non_negative("size.height", h)?;
            unit += w * h * rules.area_rate;
        }
    }

    if let Some(material) = &request.material {
        if let Some(factor) = material.price_factor {
            finite_non_negative("material.priceFactor", factor)?;
            unit *= factor;
        } else if let Some(delta) = material.price {
            finite("material.price", delta)?;
            unit += delta;
        }
    }

    if unit < 0.0 {
        return Err(PriceError::InvalidInput(format!("unit price {unit} is negative")));
    }

    let subtotal = unit * request.quantity as f64;
    let discount_rate = rules.best_tier(request.quantity).map_or(0.0, |t| t.rate);
    let amount = round_to_minor_unit(subtotal * (1.0 - discount_rate), rules.currency_minor_unit);

    Ok(PriceQuote {
        amount,
        currency_minor_unit: rules.currency_minor_unit,
        unit_price: unit,
        subtotal,
        discount_rate,
        quantity: request.quantity,
    })
}
