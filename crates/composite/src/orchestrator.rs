//! The aggregation orchestrator.

use std::time::Instant;

use common::{
    CompositeProduct, Product, Recommendation, RecommendationSummary, Review, ReviewSummary,
    ServiceAddresses,
};

use crate::error::CompositeError;
use crate::gateway::{ProductGateway, RecommendationGateway, ReviewGateway};

/// Read- and write-path coordinator over the three downstream gateways.
///
/// The product leg is critical: its failure (including not-found) fails
/// the whole read. The recommendation and review legs are best-effort:
/// any failure degrades to an empty list and is logged, never surfaced.
pub struct CompositeService {
    products: ProductGateway,
    recommendations: RecommendationGateway,
    reviews: ReviewGateway,
    service_address: String,
}

impl CompositeService {
    /// Creates the orchestrator; `service_address` names this composite
    /// instance in the diagnostics section of every response.
    pub fn new(
        products: ProductGateway,
        recommendations: RecommendationGateway,
        reviews: ReviewGateway,
        service_address: impl Into<String>,
    ) -> Self {
        Self {
            products,
            recommendations,
            reviews,
            service_address: service_address.into(),
        }
    }

    /// Fetches and assembles the composite view for one product id.
    ///
    /// The three downstream fetches run concurrently; the join resolves
    /// when all three complete or as soon as the product leg fails.
    #[tracing::instrument(skip(self))]
    pub async fn get_composite(&self, product_id: i32) -> Result<CompositeProduct, CompositeError> {
        validate_product_id(product_id)?;

        metrics::counter!("composite_reads_total").increment(1);
        let started = Instant::now();

        let (product, recommendations, reviews) = tokio::try_join!(
            async {
                self.products
                    .fetch(product_id)
                    .await
                    .map_err(CompositeError::Downstream)
            },
            async {
                Ok::<_, CompositeError>(self.recommendations_best_effort(product_id).await)
            },
            async { Ok::<_, CompositeError>(self.reviews_best_effort(product_id).await) },
        )?;

        metrics::histogram!("composite_read_duration_seconds")
            .record(started.elapsed().as_secs_f64());

        Ok(self.assemble(product, recommendations, reviews))
    }

    /// Splits the aggregate into per-resource CREATE commands and
    /// dispatches each as an event. Dispatches are independent: a failed
    /// send is reported but nothing already dispatched is rolled back.
    #[tracing::instrument(skip(self, body), fields(product_id = body.product_id))]
    pub async fn create_composite(&self, body: CompositeProduct) -> Result<(), CompositeError> {
        validate_product_id(body.product_id)?;

        tracing::debug!("dispatching composite create");

        let product = Product::new(body.product_id, body.name.clone(), body.weight);
        self.products.request_create(&product).await?;

        for summary in &body.recommendations {
            let recommendation = Recommendation {
                product_id: body.product_id,
                recommendation_id: summary.recommendation_id,
                author: summary.author.clone(),
                rate: summary.rate,
                content: summary.content.clone(),
                origin_address: String::new(),
            };
            self.recommendations.request_create(&recommendation).await?;
        }

        for summary in &body.reviews {
            let review = Review {
                product_id: body.product_id,
                review_id: summary.review_id,
                author: summary.author.clone(),
                rate: summary.rate,
                content: summary.content.clone(),
                origin_address: String::new(),
            };
            self.reviews.request_create(&review).await?;
        }

        Ok(())
    }

    /// Dispatches one DELETE per resource type, unconditionally.
    ///
    /// Deletion is idempotent by design: all three events go out even when
    /// some of the resources never existed for this id, and all three are
    /// attempted even if one send fails.
    #[tracing::instrument(skip(self))]
    pub async fn delete_composite(&self, product_id: i32) -> Result<(), CompositeError> {
        validate_product_id(product_id)?;

        tracing::debug!("dispatching composite delete");

        let product = self.products.request_delete(product_id).await;
        let recommendations = self.recommendations.request_delete(product_id).await;
        let reviews = self.reviews.request_delete(product_id).await;

        product?;
        recommendations?;
        reviews?;
        Ok(())
    }

    async fn recommendations_best_effort(&self, product_id: i32) -> Vec<Recommendation> {
        match self.recommendations.fetch(product_id).await {
            Ok(list) => list,
            Err(error) => {
                metrics::counter!("composite_degraded_legs_total").increment(1);
                tracing::warn!(
                    product_id,
                    error = %error,
                    "recommendation fetch failed, returning empty list"
                );
                Vec::new()
            }
        }
    }

    async fn reviews_best_effort(&self, product_id: i32) -> Vec<Review> {
        match self.reviews.fetch(product_id).await {
            Ok(list) => list,
            Err(error) => {
                metrics::counter!("composite_degraded_legs_total").increment(1);
                tracing::warn!(
                    product_id,
                    error = %error,
                    "review fetch failed, returning empty list"
                );
                Vec::new()
            }
        }
    }

    fn assemble(
        &self,
        product: Product,
        recommendations: Vec<Recommendation>,
        reviews: Vec<Review>,
    ) -> CompositeProduct {
        let recommendation_address = recommendations
            .first()
            .map(|r| r.origin_address.clone())
            .unwrap_or_default();
        let review_address = reviews
            .first()
            .map(|r| r.origin_address.clone())
            .unwrap_or_default();

        CompositeProduct {
            product_id: product.product_id,
            name: product.name,
            weight: product.weight,
            recommendations: recommendations.iter().map(RecommendationSummary::from).collect(),
            reviews: reviews.iter().map(ReviewSummary::from).collect(),
            service_addresses: Some(ServiceAddresses {
                composite: self.service_address.clone(),
                product: product.origin_address,
                recommendation: recommendation_address,
                review: review_address,
            }),
        }
    }
}

fn validate_product_id(product_id: i32) -> Result<(), CompositeError> {
    if product_id < 1 {
        return Err(CompositeError::InvalidInput(format!(
            "Invalid productId: {product_id}"
        )));
    }
    Ok(())
}
