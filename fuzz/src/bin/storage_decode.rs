#[macro_use]
extern crate afl;
use ed25519_dalek::SigningKey;
use tessera::PrivateKeyBundle;

fn main() {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .expect("Setup failed");
    let wallet = SigningKey::from_bytes(&[7u8; 32]);

    fuzz!(|data: &[u8]| {
        let _ = runtime.block_on(PrivateKeyBundle::decode(&wallet, data));
    });
}
