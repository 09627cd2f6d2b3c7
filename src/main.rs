//! Brochure Backend - binary entry point
//! Delegates to the library for all app logic.

#[tokio::main]
async fn main() {
    brochure_backend::run().await;
}
