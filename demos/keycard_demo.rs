//! # Keycard Creation Demo
//!
//! Walks through minting a root organization card and a root user card,
//! the way a new server and its first workspace come into being.
//!
//! ## Run
//!
//! ```bash
//! cargo run --example keycard_demo
//! ```

use keycard_core::cardgen::{generate_org_card, generate_user_card};
use keycard_core::{Keycard, SigningPair};

fn main() {
    println!("=== Keycard Core: Root Card Demo ===\n");
    println!("Engine version {}\n", keycard_core::version());

    let dir = tempfile::tempdir().expect("Failed to create scratch directory");
    println!("Working in {}\n", dir.path().display());

    // Step 1: the organization mints its identity
    println!("Step 1: Generating the root organization card...");

    let org_card = generate_org_card(
        &[
            ("Name", "Acme, Inc."),
            ("Contact-Admin", "admin/acme.com"),
            ("Contact-Abuse", "abuse/acme.com"),
            ("Language", "en"),
        ],
        dir.path(),
    )
    .expect("Failed to generate the organization card");

    let org_root = org_card.root().expect("org card has a root");
    println!("  Entry type:  {}", org_root.entry_type());
    println!("  Index:       {}", org_root.field("Index").unwrap());
    println!("  Primary key: {}", org_root.field("Primary-Verification-Key").unwrap());
    println!("  Hash:        {}", org_root.hash());
    println!();

    // Step 2: a user registers with the organization
    println!("Step 2: Generating a root user card (organization-signed)...");

    let org_skey = SigningPair::load(&dir.path().join("org_signing_keypair.jk"))
        .expect("Failed to reload the org signing key");

    let user_card = generate_user_card(
        &[("User-ID", "csimons"), ("Domain", "acme.com")],
        &org_skey.private_key(),
        dir.path(),
    )
    .expect("Failed to generate the user card");

    let user_root = user_card.root().expect("user card has a root");
    println!("  Workspace-ID: {}", user_root.field("Workspace-ID").unwrap());
    println!("  Signatures:   Organization + Hash + User");
    println!();

    // Step 3: anyone can verify the published cards
    println!("Step 3: Verifying from the files alone...");

    let loaded = Keycard::load(&dir.path().join("user.kc")).expect("Failed to load user.kc");
    let root = loaded.root().expect("loaded card has a root");

    root.is_compliant().expect("loaded entry is compliant");
    root.verify_hash().expect("hash verifies");
    root.verify_signature(&org_skey.public_key(), "Organization")
        .expect("organization signature verifies");

    println!("  [OK] compliant, hash verified, organization signature verified");
    println!();
    println!("The user entry on the wire:\n");
    print!(
        "{}",
        String::from_utf8_lossy(&root.make_bytestring(keycard_core::keycard::ALL_SIGNATURES))
    );
}
