//! Dynamic filter facets over the active catalog.
//!
//! Facet computation is a pure function over an in-memory snapshot of the
//! active products and the category forest. For each facet family the
//! product set is narrowed by every selection except that family's own,
//! so picking a manufacturer never removes the other manufacturers from
//! its own facet. Values the caller already selected stay visible even
//! when the current narrowing leaves them with no matches.

use std::collections::HashSet;

use sqlx::PgPool;
use uuid::Uuid;

use crate::db::CatalogRepository;
use crate::error::Result;
use crate::models::{
    CategoryForest, DiscountState, Facet, FacetKind, FacetQuery, FilterValue, Product,
};
use crate::services::search;

#[derive(Clone)]
pub struct FacetService {
    repository: CatalogRepository,
}

impl FacetService {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: CatalogRepository::new(pool),
        }
    }

    pub async fn facets(&self, query: &FacetQuery) -> Result<Vec<Facet>> {
        query.validate()?;
        let products = self.repository.active_products().await?;
        let forest = CategoryForest::new(self.repository.categories().await?);
        Ok(compute_facets(&products, &forest, query))
    }
}

/// The query selections, resolved against the category forest.
struct Criteria<'a> {
    category_scope: Option<HashSet<Uuid>>,
    subcategory_scope: Option<HashSet<Uuid>>,
    manufacturers: Option<HashSet<&'a str>>,
    discount: Option<bool>,
    min_price: Option<rust_decimal::Decimal>,
    max_price: Option<rust_decimal::Decimal>,
    search_terms: Option<Vec<String>>,
}

impl<'a> Criteria<'a> {
    fn resolve(query: &'a FacetQuery, forest: &CategoryForest) -> Self {
        let category_scope = query.category_id.map(|id| forest.closure(id));
        let subcategory_scope = if query.subcategory_ids.is_empty() {
            None
        } else {
            Some(forest.closure_of(&query.subcategory_ids))
        };
        let manufacturers = if query.manufacturers.is_empty() {
            None
        } else {
            Some(query.manufacturers.iter().map(String::as_str).collect())
        };
        // Selecting both discount states constrains nothing.
        let discount = match (
            query.discounts.contains(&DiscountState::WithDiscount),
            query.discounts.contains(&DiscountState::WithoutDiscount),
        ) {
            (true, false) => Some(true),
            (false, true) => Some(false),
            _ => None,
        };
        Self {
            category_scope,
            subcategory_scope,
            manufacturers,
            discount,
            min_price: query.min_price,
            max_price: query.max_price,
            search_terms: search::active_terms(query.search.as_deref()),
        }
    }

    /// Does `product` satisfy every selection except the one owned by
    /// `except`?
    fn matches(&self, product: &Product, except: Option<FacetKind>) -> bool {
        if let Some(scope) = &self.category_scope {
            if !product.category_ids.iter().any(|id| scope.contains(id)) {
                return false;
            }
        }
        if except != Some(FacetKind::Subcategory) {
            if let Some(scope) = &self.subcategory_scope {
                if !product.category_ids.iter().any(|id| scope.contains(id)) {
                    return false;
                }
            }
        }
        if except != Some(FacetKind::Manufacturer) {
            if let Some(selected) = &self.manufacturers {
                if !selected.contains(product.manufacturer.as_str()) {
                    return false;
                }
            }
        }
        if except != Some(FacetKind::Discount) {
            if let Some(with_discount) = self.discount {
                if product.has_discount() != with_discount {
                    return false;
                }
            }
        }
        if let Some(min) = self.min_price {
            if product.price < min {
                return false;
            }
        }
        if let Some(max) = self.max_price {
            if product.price > max {
                return false;
            }
        }
        if let Some(terms) = &self.search_terms {
            if !search::product_matches(product, terms) {
                return false;
            }
        }
        true
    }
}

/// Builds the facet list for one listing request. Facets appear in a fixed
/// order; a facet with nothing to offer is omitted entirely.
pub fn compute_facets(
    products: &[Product],
    forest: &CategoryForest,
    query: &FacetQuery,
) -> Vec<Facet> {
    let criteria = Criteria::resolve(query, forest);

    let mut facets = Vec::with_capacity(3);
    if let Some(facet) = manufacturer_facet(products, &criteria, query) {
        facets.push(facet);
    }
    if let Some(facet) = subcategory_facet(products, forest, &criteria, query) {
        facets.push(facet);
    }
    facets.push(discount_facet());
    facets
}

fn manufacturer_facet(
    products: &[Product],
    criteria: &Criteria<'_>,
    query: &FacetQuery,
) -> Option<Facet> {
    let mut names: Vec<&str> = products
        .iter()
        .filter(|p| criteria.matches(p, Some(FacetKind::Manufacturer)))
        .map(|p| p.manufacturer.as_str())
        .collect();
    // Selected manufacturers stay listed even with zero remaining matches,
    // otherwise the user could not see or undo the selection.
    names.extend(query.manufacturers.iter().map(String::as_str));
    names.sort_unstable();
    names.dedup();
    names.retain(|name| !name.is_empty());

    if names.is_empty() {
        return None;
    }

    Some(Facet {
        kind: FacetKind::Manufacturer,
        name: FacetKind::Manufacturer.display_name().to_string(),
        filter_values: names
            .into_iter()
            .map(|name| FilterValue {
                id: name.to_string(),
                name: name.to_string(),
            })
            .collect(),
    })
}

fn subcategory_facet(
    products: &[Product],
    forest: &CategoryForest,
    criteria: &Criteria<'_>,
    query: &FacetQuery,
) -> Option<Facet> {
    // Subcategories only make sense inside a chosen category.
    let category_id = query.category_id?;

    let matching: Vec<&Product> = products
        .iter()
        .filter(|p| criteria.matches(p, Some(FacetKind::Subcategory)))
        .collect();

    let selected: HashSet<Uuid> = query.subcategory_ids.iter().copied().collect();
    let mut values = Vec::new();
    for &child in forest.children(category_id) {
        let scope = forest.closure(child);
        let has_match = matching
            .iter()
            .any(|p| p.category_ids.iter().any(|id| scope.contains(id)));
        if has_match || selected.contains(&child) {
            if let Some(category) = forest.get(child) {
                values.push(FilterValue {
                    id: category.id.to_string(),
                    name: category.name.clone(),
                });
            }
        }
    }

    if values.is_empty() {
        return None;
    }

    Some(Facet {
        kind: FacetKind::Subcategory,
        name: FacetKind::Subcategory.display_name().to_string(),
        filter_values: values,
    })
}

/// The discount facet is unconditional: both fixed states are offered no
/// matter what the data says, so the control never disappears.
fn discount_facet() -> Facet {
    let values = [DiscountState::WithDiscount, DiscountState::WithoutDiscount]
        .iter()
        .map(|state| FilterValue {
            id: state.wire_id().to_string(),
            name: state.display_name().to_string(),
        })
        .collect();

    Facet {
        kind: FacetKind::Discount,
        name: FacetKind::Discount.display_name().to_string(),
        filter_values: values,
    }
}
