//! Environment merging with fixed precedence.

use std::collections::HashMap;

/// Merges environment layers; later layers win on key collision.
///
/// The caller passes layers in precedence order: wrapper variables,
/// compatibility-layer variables, explicit per-game overrides. The
/// inherited process environment is the implicit base, applied by the
/// supervisor underneath the result.
pub fn merge_env_layers(layers: &[&HashMap<String, String>]) -> HashMap<String, String> {
    let mut merged = HashMap::new();
    for layer in layers {
        for (key, value) in layer.iter() {
            merged.insert(key.clone(), value.clone());
        }
    }
    merged
}
