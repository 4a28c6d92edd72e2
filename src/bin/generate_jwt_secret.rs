use base64::prelude::*;
use rand::RngCore;

fn main() {
    // Generate a 256-bit cryptographically secure random key
    let mut key = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut key);

    let base64_key = BASE64_STANDARD.encode(key);
    let hex_key = hex::encode(key);

    println!("Generated JWT secret key:");
    println!("Base64: {}", base64_key);
    println!("Hex:    {}", hex_key);
    println!();
    println!("Add this line to your .env file:");
    println!("JWT_SECRET={}", base64_key);
}
