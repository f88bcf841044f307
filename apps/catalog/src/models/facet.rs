//! Filter facet types and the incoming filter selection.

use serde::{Deserialize, Serialize, Serializer};
use uuid::Uuid;

use crate::error::{Error, Result};

/// The closed set of facet families the storefront renders.
///
/// The wire format keeps the legacy numeric ids the frontend was built
/// against; everywhere else the enum is used directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FacetKind {
    Manufacturer,
    Subcategory,
    Discount,
}

impl FacetKind {
    pub fn legacy_id(&self) -> &'static str {
        match self {
            FacetKind::Manufacturer => "1",
            FacetKind::Subcategory => "2",
            FacetKind::Discount => "3",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            FacetKind::Manufacturer => "Виробник",
            FacetKind::Subcategory => "Підкатегорія",
            FacetKind::Discount => "Знижка",
        }
    }
}

fn serialize_legacy_id<S: Serializer>(kind: &FacetKind, s: S) -> std::result::Result<S::Ok, S::Error> {
    s.serialize_str(kind.legacy_id())
}

/// Discount selection states. Selecting both is the same as selecting
/// neither.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiscountState {
    #[serde(rename = "with-discount")]
    WithDiscount,
    #[serde(rename = "without-discount")]
    WithoutDiscount,
}

impl DiscountState {
    pub fn wire_id(&self) -> &'static str {
        match self {
            DiscountState::WithDiscount => "with-discount",
            DiscountState::WithoutDiscount => "without-discount",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            DiscountState::WithDiscount => "Зі знижкою",
            DiscountState::WithoutDiscount => "Без знижки",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterValue {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Facet {
    #[serde(rename = "id", serialize_with = "serialize_legacy_id")]
    pub kind: FacetKind,
    pub name: String,
    pub filter_values: Vec<FilterValue>,
}

/// The caller's current filter selection.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FacetQuery {
    pub category_id: Option<Uuid>,
    pub subcategory_ids: Vec<Uuid>,
    pub manufacturers: Vec<String>,
    pub discounts: Vec<DiscountState>,
    pub min_price: Option<rust_decimal::Decimal>,
    pub max_price: Option<rust_decimal::Decimal>,
    pub search: Option<String>,
}

impl FacetQuery {
    pub fn validate(&self) -> Result<()> {
        if let Some(min) = self.min_price {
            if min.is_sign_negative() {
                return Err(Error::Validation {
                    field: "minPrice",
                    message: "price bound must not be negative".into(),
                });
            }
        }
        if let Some(max) = self.max_price {
            if max.is_sign_negative() {
                return Err(Error::Validation {
                    field: "maxPrice",
                    message: "price bound must not be negative".into(),
                });
            }
        }
        if let (Some(min), Some(max)) = (self.min_price, self.max_price) {
            if max < min {
                return Err(Error::Validation {
                    field: "maxPrice",
                    message: "upper price bound is below the lower bound".into(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn facet_serializes_with_legacy_id() {
        let facet = Facet {
            kind: FacetKind::Manufacturer,
            name: FacetKind::Manufacturer.display_name().to_string(),
            filter_values: vec![FilterValue {
                id: "Bosch".into(),
                name: "Bosch".into(),
            }],
        };
        let json = serde_json::to_value(&facet).unwrap();
        assert_eq!(json["id"], "1");
        assert_eq!(json["name"], "Виробник");
        assert_eq!(json["filterValues"][0]["id"], "Bosch");
    }

    #[test]
    fn inverted_price_bounds_are_rejected() {
        let query = FacetQuery {
            min_price: Some(Decimal::new(100, 0)),
            max_price: Some(Decimal::new(50, 0)),
            ..FacetQuery::default()
        };
        assert!(matches!(
            query.validate(),
            Err(Error::Validation { field: "maxPrice", .. })
        ));
    }

    #[test]
    fn negative_min_price_is_rejected() {
        let query = FacetQuery {
            min_price: Some(Decimal::new(-1, 0)),
            ..FacetQuery::default()
        };
        assert!(query.validate().is_err());
    }

    #[test]
    fn empty_query_is_valid() {
        assert!(FacetQuery::default().validate().is_ok());
    }

    #[test]
    fn discount_state_wire_ids() {
        let json = serde_json::to_string(&DiscountState::WithDiscount).unwrap();
        assert_eq!(json, "\"with-discount\"");
        let parsed: DiscountState = serde_json::from_str("\"without-discount\"").unwrap();
        assert_eq!(parsed, DiscountState::WithoutDiscount);
    }
}
