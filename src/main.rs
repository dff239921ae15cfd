//! mingle-web server binary.

#[tokio::main]
async fn main() {
    mingle::web::run().await;
}
