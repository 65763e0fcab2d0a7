// ABOUTME: Main library entry point for shelf-scout, a product metadata extractor for commerce links.
// ABOUTME: Re-exports the public API: Client, ClientBuilder, Options, ScoutError, result types and URL/quantity helpers.

//! shelf-scout - turn a shared commerce link into a product record.
//!
//! Pages are retrieved through an ordered chain of strategies (first-party
//! relay, public proxies, direct request), then mined for title, image,
//! price and description. JSON-LD `Product` data wins on the priority
//! platform; social meta tags and page markup fill the gaps. Titles are
//! scanned for quantity expressions such as `500ml x 24팩`.
//!
//! # Example
//!
//! ```no_run
//! use shelf_scout::{Client, ProductDraft, ScoutError};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), ScoutError> {
//!     let client = Client::builder().build();
//!     let link = "https://www.coupang.com/vp/products/123?itemId=4&src=share";
//!     let draft = match client.prepare_product(link).await {
//!         Ok(draft) => draft,
//!         Err(err) => {
//!             eprintln!("{}", err.user_message());
//!             ProductDraft::manual(link)
//!         }
//!     };
//!     println!("{:?} missing {:?}", draft.name, draft.missing);
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod error;
pub mod extractors;
pub mod options;
pub mod platform;
pub mod quantity;
pub mod relay;
pub mod resource;
pub mod result;
pub mod retrieval;

pub use crate::client::Client;
pub use crate::error::{ErrorCode, ScoutError};
pub use crate::options::{ClientBuilder, Options};
pub use crate::platform::{detect_platform, is_valid_product_url, normalize_url, Platform};
pub use crate::quantity::{
    format_quantity, parse_multiple_quantities, parse_quantity_from_text, ParsedQuantity,
};
pub use crate::result::{
    Extraction, ProductDraft, ProductMetadata, RequiredField, Validation,
};
pub use crate::retrieval::{
    Attempt, AttemptOutcome, DirectStrategy, ProxyStrategy, RelayStrategy, Retrieval,
    RetrievalChain, RetrievalStrategy,
};
