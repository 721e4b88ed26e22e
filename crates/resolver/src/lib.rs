//! Response resolution engine.
//!
//! `resolve` is total: every internal failure — classification outage,
//! image service outage, catalog miss — is translated into a user-facing
//! string, because the chat surface must always receive something. Only
//! credential problems are handled elsewhere (they never reach this engine).

use std::sync::Arc;

use {
    async_trait::async_trait,
    tracing::warn,
};

use {
    carbot_catalog::{CatalogItem, SqliteCatalog},
    carbot_media::{MediaRef, UnsplashImageSearch},
    carbot_nlu::{ClassificationResult, Intent, WitClassifier},
};

// ── Adapter seams ────────────────────────────────────────────────────────────

#[async_trait]
pub trait IntentClassifier: Send + Sync {
    async fn classify(&self, text: &str) -> carbot_nlu::Result<ClassificationResult>;
}

#[async_trait]
pub trait ImageSearch: Send + Sync {
    async fn find_image(&self, brand: &str) -> carbot_media::Result<Option<MediaRef>>;
}

#[async_trait]
pub trait CatalogLookup: Send + Sync {
    async fn find_item(&self, brand: &str, model: &str)
    -> carbot_catalog::Result<Option<CatalogItem>>;
}

#[async_trait]
impl IntentClassifier for WitClassifier {
    async fn classify(&self, text: &str) -> carbot_nlu::Result<ClassificationResult> {
        WitClassifier::classify(self, text).await
    }
}

#[async_trait]
impl ImageSearch for UnsplashImageSearch {
    async fn find_image(&self, brand: &str) -> carbot_media::Result<Option<MediaRef>> {
        UnsplashImageSearch::find_image(self, brand).await
    }
}

#[async_trait]
impl CatalogLookup for SqliteCatalog {
    async fn find_item(
        &self,
        brand: &str,
        model: &str,
    ) -> carbot_catalog::Result<Option<CatalogItem>> {
        SqliteCatalog::find_item(self, brand, model).await
    }
}

// ── Templates ────────────────────────────────────────────────────────────────

const PROCESSING_ERROR: &str = "Sorry, there was an error processing your request.";
const CLARIFY: &str = "I'm not sure I understood that. Could you clarify?";

fn format_price(price: f64) -> String {
    format!("{price} €")
}

fn image_tag(url: &str, brand: &str) -> String {
    format!(r#"<img src="{url}" alt="{brand} car" style="max-width:100%; height:auto;">"#)
}

// ── Engine ───────────────────────────────────────────────────────────────────

/// Orchestrates classification, catalog lookup, and image enrichment into a
/// single answer string.
pub struct ResolutionEngine {
    classifier: Arc<dyn IntentClassifier>,
    images: Arc<dyn ImageSearch>,
    catalog: Arc<dyn CatalogLookup>,
}

impl ResolutionEngine {
    pub fn new(
        classifier: Arc<dyn IntentClassifier>,
        images: Arc<dyn ImageSearch>,
        catalog: Arc<dyn CatalogLookup>,
    ) -> Self {
        Self {
            classifier,
            images,
            catalog,
        }
    }

    /// Resolve one utterance to an answer. Never fails outward.
    pub async fn resolve(&self, text: &str) -> String {
        let classification = match self.classifier.classify(text).await {
            Ok(c) => c,
            Err(e) => {
                warn!(error = %e, "classification failed");
                return PROCESSING_ERROR.into();
            },
        };

        if classification.intent == Some(Intent::Image)
            && let Some(ref brand) = classification.brand
        {
            return self.resolve_image(brand).await;
        }

        // Brand and model are required as a pair; a lone entity falls
        // through to the clarification message.
        if let (Some(brand), Some(model)) = (&classification.brand, &classification.model) {
            return self.resolve_catalog(classification.intent, brand, model).await;
        }

        CLARIFY.into()
    }

    async fn resolve_image(&self, brand: &str) -> String {
        match self.images.find_image(brand).await {
            Ok(Some(media)) => image_tag(&media.url, brand),
            Ok(None) => format!("Sorry, I couldn't find an image for the {brand}."),
            Err(e) => {
                warn!(error = %e, brand, "image search failed");
                format!("Sorry, I couldn't find an image for the {brand}.")
            },
        }
    }

    async fn resolve_catalog(&self, intent: Option<Intent>, brand: &str, model: &str) -> String {
        let item = match self.catalog.find_item(brand, model).await {
            Ok(item) => item,
            Err(e) => {
                warn!(error = %e, brand, model, "catalog lookup failed");
                None
            },
        };

        if let Some(item) = item {
            match intent {
                Some(Intent::Price) => {
                    return format!(
                        "The price of the {} {} is {}.",
                        item.brand,
                        item.model,
                        format_price(item.price)
                    );
                },
                Some(Intent::Info) | Some(Intent::Description) => {
                    return format!(
                        "The {} {} is a {} car with {} transmission. {}",
                        item.brand,
                        item.model,
                        item.fuel_type,
                        item.transmission,
                        item.description
                    );
                },
                // A hit with any other intent deliberately shares the
                // not-found message below.
                _ => {},
            }
        }

        format!("Sorry, I don't have information about the {brand} {model}.")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FakeClassifier(Result<ClassificationResult, ()>);

    #[async_trait]
    impl IntentClassifier for FakeClassifier {
        async fn classify(&self, _text: &str) -> carbot_nlu::Result<ClassificationResult> {
            match &self.0 {
                Ok(c) => Ok(c.clone()),
                Err(()) => Err(carbot_nlu::Error::Status {
                    status: 503,
                    body: "down".into(),
                }),
            }
        }
    }

    enum FakeImages {
        Found(String),
        Missing,
        Failing,
    }

    #[async_trait]
    impl ImageSearch for FakeImages {
        async fn find_image(&self, _brand: &str) -> carbot_media::Result<Option<MediaRef>> {
            match self {
                Self::Found(url) => Ok(Some(MediaRef { url: url.clone() })),
                Self::Missing => Ok(None),
                Self::Failing => Err(carbot_media::Error::Status {
                    status: 500,
                    body: "boom".into(),
                }),
            }
        }
    }

    struct FakeCatalog(Option<CatalogItem>);

    #[async_trait]
    impl CatalogLookup for FakeCatalog {
        async fn find_item(
            &self,
            brand: &str,
            model: &str,
        ) -> carbot_catalog::Result<Option<CatalogItem>> {
            let hit = self.0.as_ref().filter(|item| {
                item.brand.to_lowercase() == brand.trim().to_lowercase()
                    && item.model.to_lowercase() == model.trim().to_lowercase()
            });
            Ok(hit.cloned())
        }
    }

    fn camry() -> CatalogItem {
        CatalogItem {
            brand: "Toyota".into(),
            model: "Camry".into(),
            price: 25000.0,
            fuel_type: "petrol".into(),
            transmission: "automatic".into(),
            description: "A reliable mid-size sedan.".into(),
        }
    }

    fn classification(
        intent: Option<Intent>,
        brand: Option<&str>,
        model: Option<&str>,
    ) -> ClassificationResult {
        ClassificationResult {
            intent,
            brand: brand.map(String::from),
            model: model.map(String::from),
        }
    }

    fn engine(
        classifier: FakeClassifier,
        images: FakeImages,
        catalog: FakeCatalog,
    ) -> ResolutionEngine {
        ResolutionEngine::new(Arc::new(classifier), Arc::new(images), Arc::new(catalog))
    }

    #[tokio::test]
    async fn price_intent_formats_price_with_currency() {
        let engine = engine(
            FakeClassifier(Ok(classification(
                Some(Intent::Price),
                Some("Toyota"),
                Some("camry"),
            ))),
            FakeImages::Missing,
            FakeCatalog(Some(camry())),
        );
        assert_eq!(
            engine.resolve("What's the price of the Toyota Camry?").await,
            "The price of the Toyota Camry is 25000 €."
        );
    }

    #[tokio::test]
    async fn info_intent_uses_the_templated_sentence() {
        let engine = engine(
            FakeClassifier(Ok(classification(
                Some(Intent::Info),
                Some("Toyota"),
                Some("camry"),
            ))),
            FakeImages::Missing,
            FakeCatalog(Some(camry())),
        );
        assert_eq!(
            engine.resolve("tell me about the camry").await,
            "The Toyota Camry is a petrol car with automatic transmission. A reliable mid-size sedan."
        );
    }

    #[tokio::test]
    async fn catalog_miss_yields_not_found_regardless_of_intent() {
        let engine = engine(
            FakeClassifier(Ok(classification(
                Some(Intent::Price),
                Some("BrandX"),
                Some("modely"),
            ))),
            FakeImages::Missing,
            FakeCatalog(None),
        );
        assert_eq!(
            engine.resolve("price of a BrandX ModelY?").await,
            "Sorry, I don't have information about the BrandX modely."
        );
    }

    #[tokio::test]
    async fn hit_with_unmatched_intent_shares_the_not_found_message() {
        let engine = engine(
            FakeClassifier(Ok(classification(None, Some("Toyota"), Some("camry")))),
            FakeImages::Missing,
            FakeCatalog(Some(camry())),
        );
        assert_eq!(
            engine.resolve("toyota camry").await,
            "Sorry, I don't have information about the Toyota camry."
        );
    }

    #[tokio::test]
    async fn image_intent_embeds_the_media_reference() {
        let engine = engine(
            FakeClassifier(Ok(classification(Some(Intent::Image), Some("Tesla"), None))),
            FakeImages::Found("https://img.example/t.jpg".into()),
            FakeCatalog(None),
        );
        let out = engine.resolve("show me a tesla").await;
        assert!(out.contains(r#"src="https://img.example/t.jpg""#));
        assert!(out.contains(r#"alt="Tesla car""#));
    }

    #[tokio::test]
    async fn image_miss_and_image_failure_share_the_graceful_message() {
        for images in [FakeImages::Missing, FakeImages::Failing] {
            let engine = engine(
                FakeClassifier(Ok(classification(Some(Intent::Image), Some("Tesla"), None))),
                images,
                FakeCatalog(None),
            );
            assert_eq!(
                engine.resolve("show me a tesla").await,
                "Sorry, I couldn't find an image for the Tesla."
            );
        }
    }

    #[tokio::test]
    async fn lone_brand_falls_through_to_clarification() {
        let engine = engine(
            FakeClassifier(Ok(classification(Some(Intent::Price), Some("Toyota"), None))),
            FakeImages::Missing,
            FakeCatalog(Some(camry())),
        );
        assert_eq!(engine.resolve("how much is a toyota?").await, CLARIFY);
    }

    #[tokio::test]
    async fn no_intent_and_no_entities_asks_for_clarification() {
        let engine = engine(
            FakeClassifier(Ok(ClassificationResult::default())),
            FakeImages::Missing,
            FakeCatalog(None),
        );
        assert_eq!(engine.resolve("blah").await, CLARIFY);
    }

    #[tokio::test]
    async fn classification_outage_becomes_the_generic_apology() {
        let engine = engine(
            FakeClassifier(Err(())),
            FakeImages::Missing,
            FakeCatalog(None),
        );
        assert_eq!(engine.resolve("anything").await, PROCESSING_ERROR);
    }
}
