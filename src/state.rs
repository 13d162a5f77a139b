use moneta_backend::factory::AuctionFactory;
use moneta_backend::images::ImageClient;

/// Shared application state
pub struct AppState {
    pub factory: AuctionFactory,
    pub images: ImageClient,
}
