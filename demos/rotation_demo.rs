//! # Key Rotation Demo
//!
//! Demonstrates chaining: how a principal rotates its keys while keeping a
//! verifiable line of custody back to its root entry.
//!
//! ## Run
//!
//! ```bash
//! cargo run --example rotation_demo
//! ```

use keycard_core::{EncryptionPair, Entry, EntryType, Keycard, SigningPair};

fn main() {
    println!("=== Keycard Core: Key Rotation Demo ===\n");

    // Step 1: a compliant organization root
    println!("Step 1: Building the root entry...");

    let sign = SigningPair::generate();
    let encrypt = EncryptionPair::generate();

    let mut root = Entry::new(EntryType::Organization);
    root.set_fields(&[
        ("Name", "Example, Inc."),
        ("Contact-Admin", "admin/example.com"),
        ("Primary-Verification-Key", &sign.public_key().to_string()),
        ("Encryption-Key", &encrypt.public_key().to_string()),
    ])
    .expect("Failed to set fields");
    root.sign(&sign.private_key(), "Organization")
        .expect("Failed to self-sign");
    root.generate_hash("BLAKE3-256").expect("Failed to hash");
    root.is_compliant().expect("root is compliant");

    println!("  Index 1, hash {}\n", root.hash());

    // Step 2: rotate
    println!("Step 2: Chaining a successor (optional rotation on)...");
    println!();
    println!("  ┌─────────────────────────────────────────────────────────────┐");
    println!("  │                      KEY ROTATION                           │");
    println!("  ├─────────────────────────────────────────────────────────────┤");
    println!("  │                                                             │");
    println!("  │   Entry 1 ────────────────────► Entry 2                     │");
    println!("  │     │                             │                         │");
    println!("  │     │ old signing key ──signs──► Custody-Signature          │");
    println!("  │     │ hash ───────────recorded─► Previous-Hash              │");
    println!("  │     │                             │                         │");
    println!("  │     └── keys retire               └── fresh keys published  │");
    println!("  │                                                             │");
    println!("  └─────────────────────────────────────────────────────────────┘");
    println!();

    let mut card = Keycard::new(EntryType::Organization);
    card.add_root(root).expect("Failed to install root");

    let bundle = card
        .chain(&sign.private_key(), true)
        .expect("Failed to chain");

    // The organization finishes the rotation with its new primary
    let new_primary = bundle.sign.as_ref().expect("bundle has a primary");
    let entry = card.current_mut().expect("card has a newest entry");
    entry
        .sign(&new_primary.private, "Organization")
        .expect("Failed to sign with the new primary");
    entry.generate_hash("BLAKE3-256").expect("Failed to hash");

    println!("  Entry 2 index:     {}", card.current().unwrap().field("Index").unwrap());
    println!(
        "  New primary key:   {}",
        card.current().unwrap().field("Primary-Verification-Key").unwrap()
    );
    println!(
        "  New secondary key: {}",
        card.current().unwrap().field("Secondary-Verification-Key").unwrap()
    );
    println!();

    // Step 3: verify the whole chain
    println!("Step 3: Verifying the chain...");
    match card.verify() {
        Ok(()) => println!("  [OK] custody chain verifies back to the root"),
        Err(e) => println!("  [FAILED] {}", e),
    }

    // Step 4: demonstrate tamper evidence
    println!("\nStep 4: Tampering with the newest entry...");
    let entry = card.current_mut().expect("card has a newest entry");
    entry
        .set_field("Name", "Evil Example, Inc.")
        .expect("Failed to set field");

    match card.verify() {
        Ok(()) => println!("  [UNEXPECTED] chain still verifies"),
        Err(e) => println!("  [OK] edit detected: {}", e),
    }
}
