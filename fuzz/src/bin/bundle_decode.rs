#[macro_use]
extern crate afl;
use tessera::PublicKeyBundle;

fn main() {
    fuzz!(|data: &[u8]| {
        if let Ok(bundle) = PublicKeyBundle::from_bytes(data) {
            let _ = bundle.verify();
        }
    });
}
