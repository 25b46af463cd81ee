//! Turning generated JSON into an actor document the host will accept.
//!
//! Model output is loosely shaped: top-level fields go missing, the token is
//! half filled in, and item identifiers are frequently the wrong length or
//! reused. [`ActorData::from_generated`] patches all of that before the
//! document reaches an [`ActorStore`](crate::host::ActorStore).

use rand::distributions::{Distribution, Uniform};
use rand::Rng;
use serde_json::{json, Map, Value};
use std::collections::HashSet;

/// Placeholder portrait used when the model supplies none.
pub const DEFAULT_IMAGE: &str = "icons/svg/mystery-man.svg";

/// Length of every document identifier.
pub const ID_LENGTH: usize = 16;

/// Actor type for generated creatures.
pub const NPC_TYPE: &str = "npc";

const ID_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Generate a random lowercase alphanumeric identifier.
pub fn random_id(len: usize) -> String {
    random_id_with(&mut rand::thread_rng(), len)
}

/// Generate an identifier from a caller-supplied RNG.
pub fn random_id_with<R: Rng + ?Sized>(rng: &mut R, len: usize) -> String {
    let index = Uniform::from(0..ID_ALPHABET.len());
    (0..len)
        .map(|_| ID_ALPHABET[index.sample(rng)] as char)
        .collect()
}

/// Whether `id` is exactly [`ID_LENGTH`] lowercase ASCII alphanumerics.
pub fn is_valid_id(id: &str) -> bool {
    id.len() == ID_LENGTH
        && id
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit())
}

/// An actor document ready for creation.
#[derive(Debug, Clone, PartialEq)]
pub struct ActorData {
    pub name: String,
    pub actor_type: String,
    pub img: String,
    pub system: Value,
    pub items: Vec<Value>,
    pub prototype_token: Value,
}

impl ActorData {
    /// Build an actor from model output, filling defaults and repairing ids.
    ///
    /// `default_name` is the name the user typed; it is used when the model
    /// leaves `name` out.
    pub fn from_generated(generated: Value, default_name: &str) -> Self {
        let mut fields = match generated {
            Value::Object(map) => map,
            _ => Map::new(),
        };

        let name = take_string(&mut fields, "name").unwrap_or_else(|| default_name.to_string());
        let img = take_string(&mut fields, "img").unwrap_or_else(|| DEFAULT_IMAGE.to_string());
        let system = take_object(&mut fields, "system");
        let items = match fields.remove("items") {
            Some(Value::Array(items)) => items,
            _ => Vec::new(),
        };
        let prototype_token = take_object(&mut fields, "prototypeToken");

        let mut actor = Self {
            name,
            actor_type: NPC_TYPE.to_string(),
            img,
            system,
            items,
            prototype_token,
        };
        actor.fill_token_defaults();
        actor.apply_darkvision();

        let repaired = repair_item_ids(&mut actor.items);
        if repaired > 0 {
            tracing::debug!(repaired, "regenerated item identifiers");
        }
        actor
    }

    /// Darkvision range in `system.attributes.senses.darkvision`, if positive.
    ///
    /// Numeric strings such as `"60"` count too.
    pub fn darkvision(&self) -> Option<f64> {
        let range = self.system.pointer("/attributes/senses/darkvision")?;
        range
            .as_f64()
            .or_else(|| range.as_str().and_then(|s| s.trim().parse().ok()))
            .filter(|range: &f64| range.is_finite() && *range > 0.0)
    }

    /// Serialize to the JSON shape the host expects.
    pub fn to_value(&self) -> Value {
        json!({
            "name": self.name,
            "type": self.actor_type,
            "img": self.img,
            "system": self.system,
            "items": self.items,
            "prototypeToken": self.prototype_token,
        })
    }

    fn fill_token_defaults(&mut self) {
        let name = self.name.clone();
        let img = self.img.clone();
        let Value::Object(token) = &mut self.prototype_token else {
            return;
        };

        let has_name = token
            .get("name")
            .and_then(Value::as_str)
            .is_some_and(|n| !n.is_empty());
        if !has_name {
            token.insert("name".to_string(), Value::String(name));
        }

        let has_texture = token
            .get("texture")
            .and_then(|t| t.get("src"))
            .and_then(Value::as_str)
            .is_some_and(|src| !src.is_empty());
        if !has_texture {
            token.insert("texture".to_string(), json!({ "src": img }));
        }

        if !token.get("sight").is_some_and(Value::is_object) {
            token.insert(
                "sight".to_string(),
                json!({ "enabled": true, "range": 0, "visionMode": "basic" }),
            );
        }
    }

    fn apply_darkvision(&mut self) {
        let Some(range) = self.darkvision() else {
            return;
        };
        let Some(sight) = self
            .prototype_token
            .get_mut("sight")
            .and_then(Value::as_object_mut)
        else {
            return;
        };

        if sight.get("visionMode").and_then(Value::as_str) == Some("basic") {
            sight.insert("visionMode".to_string(), json!("darkvision"));
            sight.insert("range".to_string(), number(range));
        }
    }
}

/// Replace every missing, malformed or duplicate identifier on the items
/// and on their `system.activities` entries.
///
/// Activities are keyed by id; a bad key is moved to a fresh one and the
/// activity's own `_id` is set to match its key. Returns how many ids were
/// generated.
pub fn repair_item_ids(items: &mut [Value]) -> usize {
    let mut rng = rand::thread_rng();
    let mut seen = HashSet::new();
    let mut generated = 0;

    for item in items.iter_mut() {
        let Some(item) = item.as_object_mut() else {
            continue;
        };

        let current = item.get("_id").and_then(Value::as_str).map(str::to_string);
        match current {
            Some(id) if is_valid_id(&id) && seen.insert(id.clone()) => {}
            _ => {
                let id = fresh_id(&mut rng, &mut seen);
                item.insert("_id".to_string(), Value::String(id));
                generated += 1;
            }
        }

        let activities = item
            .get_mut("system")
            .and_then(|system| system.get_mut("activities"))
            .and_then(Value::as_object_mut);
        if let Some(activities) = activities {
            generated += repair_activity_keys(activities, &mut rng, &mut seen);
        }
    }

    generated
}

fn repair_activity_keys<R: Rng>(
    activities: &mut Map<String, Value>,
    rng: &mut R,
    seen: &mut HashSet<String>,
) -> usize {
    let mut generated = 0;
    let entries = std::mem::take(activities);

    for (key, mut activity) in entries {
        let key = if is_valid_id(&key) && seen.insert(key.clone()) {
            key
        } else {
            generated += 1;
            fresh_id(rng, seen)
        };
        if let Some(activity) = activity.as_object_mut() {
            activity.insert("_id".to_string(), Value::String(key.clone()));
        }
        activities.insert(key, activity);
    }

    generated
}

fn fresh_id<R: Rng>(rng: &mut R, seen: &mut HashSet<String>) -> String {
    loop {
        let id = random_id_with(rng, ID_LENGTH);
        if seen.insert(id.clone()) {
            return id;
        }
    }
}

fn take_string(fields: &mut Map<String, Value>, key: &str) -> Option<String> {
    match fields.remove(key) {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s),
        _ => None,
    }
}

fn take_object(fields: &mut Map<String, Value>, key: &str) -> Value {
    match fields.remove(key) {
        Some(value @ Value::Object(_)) => value,
        _ => Value::Object(Map::new()),
    }
}

/// Keep whole ranges as integers so `60` does not become `60.0`.
fn number(value: f64) -> Value {
    if value.fract() == 0.0 && value <= i64::MAX as f64 {
        json!(value as i64)
    } else {
        json!(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_id_shape() {
        for _ in 0..50 {
            let id = random_id(ID_LENGTH);
            assert!(is_valid_id(&id), "{id} should be valid");
        }
    }

    #[test]
    fn test_is_valid_id() {
        assert!(is_valid_id("abcdefgh12345678"));
        assert!(!is_valid_id("abcdefgh1234567"));
        assert!(!is_valid_id("abcdefgh123456789"));
        assert!(!is_valid_id("abcdefgh-2345678"));
        assert!(!is_valid_id("ABCDEFGH12345678"));
        assert!(!is_valid_id("abcdéfgh1234567"));
    }

    #[test]
    fn test_defaults_for_empty_document() {
        let actor = ActorData::from_generated(json!({}), "Bog Hag");
        assert_eq!(actor.name, "Bog Hag");
        assert_eq!(actor.actor_type, "npc");
        assert_eq!(actor.img, DEFAULT_IMAGE);
        assert_eq!(actor.system, json!({}));
        assert!(actor.items.is_empty());
        assert_eq!(
            actor.prototype_token,
            json!({
                "name": "Bog Hag",
                "texture": { "src": DEFAULT_IMAGE },
                "sight": { "enabled": true, "range": 0, "visionMode": "basic" }
            })
        );
    }

    #[test]
    fn test_model_fields_win_over_defaults() {
        let actor = ActorData::from_generated(
            json!({
                "name": "Grinning Jack",
                "type": "character",
                "img": "portraits/jack.webp",
                "prototypeToken": { "name": "Jack", "texture": { "src": "tokens/jack.webp" } }
            }),
            "Undead Clown",
        );
        assert_eq!(actor.name, "Grinning Jack");
        assert_eq!(actor.actor_type, "npc");
        assert_eq!(actor.img, "portraits/jack.webp");
        assert_eq!(actor.prototype_token["name"], "Jack");
        assert_eq!(actor.prototype_token["texture"]["src"], "tokens/jack.webp");
    }

    #[test]
    fn test_texture_defaults_to_actor_image() {
        let actor = ActorData::from_generated(
            json!({ "img": "portraits/jack.webp", "prototypeToken": { "texture": {} } }),
            "Jack",
        );
        assert_eq!(actor.prototype_token["texture"]["src"], "portraits/jack.webp");
    }

    #[test]
    fn test_darkvision_upgrades_basic_sight() {
        let actor = ActorData::from_generated(
            json!({ "system": { "attributes": { "senses": { "darkvision": 60, "units": "ft" } } } }),
            "Ghoul",
        );
        assert_eq!(actor.prototype_token["sight"]["visionMode"], "darkvision");
        assert_eq!(actor.prototype_token["sight"]["range"], json!(60));
        assert_eq!(actor.prototype_token["sight"]["enabled"], json!(true));
    }

    #[test]
    fn test_darkvision_written_as_string() {
        let actor = ActorData::from_generated(
            json!({ "system": { "attributes": { "senses": { "darkvision": "60" } } } }),
            "Ghoul",
        );
        assert_eq!(actor.darkvision(), Some(60.0));
        assert_eq!(actor.prototype_token["sight"]["visionMode"], "darkvision");
        assert_eq!(actor.prototype_token["sight"]["range"], json!(60));

        let actor = ActorData::from_generated(
            json!({ "system": { "attributes": { "senses": { "darkvision": "none" } } } }),
            "Commoner",
        );
        assert_eq!(actor.darkvision(), None);
        assert_eq!(actor.prototype_token["sight"]["visionMode"], "basic");
    }

    #[test]
    fn test_darkvision_leaves_custom_sight_alone() {
        let actor = ActorData::from_generated(
            json!({
                "system": { "attributes": { "senses": { "darkvision": 60 } } },
                "prototypeToken": { "sight": { "enabled": true, "range": 120, "visionMode": "tremorsense" } }
            }),
            "Bulette",
        );
        assert_eq!(actor.prototype_token["sight"]["visionMode"], "tremorsense");
        assert_eq!(actor.prototype_token["sight"]["range"], json!(120));
    }

    #[test]
    fn test_zero_darkvision_keeps_basic_sight() {
        let actor = ActorData::from_generated(
            json!({ "system": { "attributes": { "senses": { "darkvision": 0 } } } }),
            "Commoner",
        );
        assert_eq!(actor.darkvision(), None);
        assert_eq!(actor.prototype_token["sight"]["visionMode"], "basic");
        assert_eq!(actor.prototype_token["sight"]["range"], json!(0));
    }

    #[test]
    fn test_repair_replaces_bad_item_ids() {
        let mut items = vec![
            json!({ "_id": "abcdefgh12345678", "name": "Bite" }),
            json!({ "_id": "undeadfort1tude", "name": "Undead Fortitude" }),
            json!({ "_id": "lapel_flower_000", "name": "Lapel Flower" }),
            json!({ "name": "Shoe Kick" }),
            json!({ "_id": 42, "name": "Numeric" }),
        ];
        let generated = repair_item_ids(&mut items);
        assert_eq!(generated, 4);
        assert_eq!(items[0]["_id"], "abcdefgh12345678");
        for item in &items {
            assert!(is_valid_id(item["_id"].as_str().unwrap()));
        }
    }

    #[test]
    fn test_repair_makes_duplicate_ids_unique() {
        let mut items = vec![
            json!({ "_id": "abcdefgh12345678" }),
            json!({ "_id": "abcdefgh12345678" }),
        ];
        assert_eq!(repair_item_ids(&mut items), 1);
        assert_eq!(items[0]["_id"], "abcdefgh12345678");
        assert_ne!(items[0]["_id"], items[1]["_id"]);
    }

    #[test]
    fn test_repair_rekeys_activities() {
        let mut items = vec![json!({
            "_id": "lapelflower00001",
            "name": "Acid-Squirting Lapel Flower",
            "system": {
                "activities": {
                    "squirt": { "type": "attack", "damage": { "parts": [] } },
                    "attackkey0000001": { "type": "attack" }
                }
            }
        })];
        let generated = repair_item_ids(&mut items);
        assert_eq!(generated, 1);

        let activities = items[0]["system"]["activities"].as_object().unwrap();
        assert_eq!(activities.len(), 2);
        assert!(activities.contains_key("attackkey0000001"));
        for (key, activity) in activities {
            assert!(is_valid_id(key));
            assert_eq!(activity["_id"], json!(key));
        }
    }

    #[test]
    fn test_non_object_items_are_left_in_place() {
        let mut items = vec![json!("a string"), json!({ "name": "Claw" })];
        assert_eq!(repair_item_ids(&mut items), 1);
        assert_eq!(items[0], json!("a string"));
    }

    #[test]
    fn test_to_value_uses_host_field_names() {
        let actor = ActorData::from_generated(json!({ "name": "Imp" }), "Imp");
        let value = actor.to_value();
        assert_eq!(value["type"], "npc");
        assert_eq!(value["prototypeToken"], actor.prototype_token);
        assert!(value.get("prototype_token").is_none());
    }
}
