//! The generation prompt.
//!
//! One canonical schema description of a dnd5e NPC actor. The user's request
//! is embedded verbatim between `---` markers.

/// Sampling temperature used for every generation request.
pub const GENERATION_TEMPERATURE: f32 = 0.75;

/// Instruction block describing the actor JSON the model must produce.
pub const SYSTEM_INSTRUCTION: &str = r#"You are an expert D&D 5e monster designer and a Foundry VTT data architect.
Your task is to generate a complete and valid JSON object representing a D&D 5e monster stat block for Foundry VTT, specifically for the "dnd5e" system.
The output MUST be a single, valid JSON object and NOTHING ELSE. Do not include any explanatory text, markdown backticks like ```json, or any content outside of the JSON structure.

The JSON structure should follow this Foundry VTT Actor data model:
- "name": (string)
- "type": "npc"
- "img": "icons/svg/mystery-man.svg" (placeholder for actor sheet image)
- "system": {
  "abilities": { /* e.g., "str": {"value": 10, "proficient": 0} ... */ },
  "attributes": {
    "ac": { "calc": "default", "flat": null }, /* Use "default" if items provide AC, "natural" with "flat" value otherwise */
    "hp": { "value": 45, "max": 45, "formula": "6d8+18" }, /* Adjust HP based on CR */
    "movement": { "walk": 30, "units": "ft" },
    "senses": { "darkvision": 60, "units": "ft" }
  },
  "details": { "cr": 3, "alignment": "Chaotic Evil", "type": { "value": "undead", "subtype": "clown" }, "biography": {"value": "<p>A terrifying clown brought back from the dead, its laughter now an echo of despair. It uses its macabre props as deadly weapons.</p>"} },
  "traits": { "size": "med", "languages": { "value": ["common", "orcish"], "custom": "" }, "di": {"value":["poison"]}, "dr":{"value":[]}, "dv":{"value":[]}, "ci":{"value":["charmed", "exhaustion", "frightened", "paralyzed", "poisoned"]} },
  "skills": { /* e.g. "prf": {"ability":"cha", "value": 1}, "ste": {"ability":"dex", "value":1} */ }
},
"items": [ /* THIS IS CRITICAL. Populate this array with weapons, armor, and features. Each item MUST have a unique 16-character LOWERCASE alphanumeric "_id". */
  /* Example Feature (Undead Fortitude):
    {
      "_id": "undeadfortitude1", // ACTUAL 16-CHAR ID
      "name": "Undead Fortitude",
      "type": "feat",
      "img": "icons/magic/death/undead-risen-bone-skull.webp",
      "system": {
        "description": { "value": "<p>If damage reduces the undead to 0 hit points, it must make a Constitution saving throw with a DC of 5 + the damage taken, unless the damage is radiant or from a critical hit. On a success, the undead drops to 1 hit point instead.</p>" },
        "identifier":"undead-fortitude",
        "type": {"value":"monster"}
      }
    }
  */
],
"prototypeToken": { "texture": { "src": "icons/svg/mystery-man.svg" }, "sight": {"enabled": true, "range": 60, "visionMode": "darkvision"}, "name": "" }

CRITICAL:
1. All "_id" fields for items MUST be unique, 16-character, lowercase alphanumeric strings. Keys of "system.activities" follow the same rule.
2. For weapon items, "system.damage.base" should only contain base weapon dice. Additional damage (like elemental or poison) should be in "system.activities.YOUR_ACTIVITY_KEY.damage.parts" as an array of objects, each with "number", "denomination", "types" (array), and "bonus". Set "includeBase": true if you want the base weapon damage, or false if the parts array defines all damage.
3. Ensure "system.abilities.xxx.proficient" is 0 or 1 for saving throw proficiency.
4. "system.attributes.hp.formula" must be a dice formula.
5. "system.attributes.ac.calc" should be "default" if armor is equipped in items (list as an item with "type": "equipment", "system.armor.value", and "system.equipped": true), or "natural" with a "flat" value otherwise.
6. Base all stats (abilities, HP, AC, attack bonuses, damage dice) on the requested CR and creature type/concept.
7. Include the specific attacks and traits requested by the user as items in the "items" array.
"#;

/// Wrap the user's structured request in the full instruction prompt.
pub fn build_generation_prompt(user_prompt: &str) -> String {
    format!(
        "{SYSTEM_INSTRUCTION}\nUser's request:\n---\n{user_prompt}\n---\nGenerate ONLY the JSON object.\n"
    )
}
