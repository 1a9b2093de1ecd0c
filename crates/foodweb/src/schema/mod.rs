//! Input decoders for the food-web domain.
//!
//! Field rules follow the client-facing forms: bounded name, non-negative
//! lifespan, positive weight. Relationship fields decode to typed ids with
//! table restrictions — eaten-by entries must be animal tokens, diet
//! entries may be either table.

use crate::decode::refinements::{integer, max_length, min, min_length};
use crate::decode::{array, literal, number, object, string, union, Decoder, ErrorTree};
use crate::model::{
    Animal, AnimalInput, AnimalPatch, AnimalRowPatch, DeleteLivingThingArgs, GlobalId,
    AllLivingThingsArgs, LivingThingArgs, LivingThingInput, LivingThingPatch, Plant, PlantInput,
    PlantLifecycle, PlantPatch, PlantRowPatch, Table, UpdateLivingThingArgs,
};

// =============================================================================
// IDS
// =============================================================================

/// Decodes any global id token.
///
/// The client-facing code stays generic; the structured decode error is
/// logged for diagnosis and never leaves the process.
pub fn id() -> Decoder<GlobalId> {
    string().parse(|token, raw| match GlobalId::parse(&token) {
        Ok(id) => Ok(id),
        Err(err) => {
            tracing::debug!(token = %token, error = %err, "global id rejected");
            Err(ErrorTree::leaf(raw.clone(), "invalid"))
        }
    })
}

/// Restricts accepted tokens to a table subset.
pub fn typed_id(tables: &'static [Table], code: &'static str) -> Decoder<GlobalId> {
    id().refine(move |gid| tables.contains(&gid.table()), code)
}

/// Animal-table tokens only.
pub fn animal_id() -> Decoder<GlobalId> {
    typed_id(&[Table::Animal], "not_animal")
}

/// Plant-table tokens only.
pub fn plant_id() -> Decoder<GlobalId> {
    typed_id(&[Table::Plant], "not_plant")
}

/// Either table; a failure surfaces both alternatives.
pub fn living_thing_id() -> Decoder<GlobalId> {
    union(vec![animal_id(), plant_id()])
}

// =============================================================================
// FIELDS
// =============================================================================

/// Display name: 1 to 255 characters.
pub fn name() -> Decoder<String> {
    max_length(&min_length(&string(), 1), 255)
}

/// Lifespan in days, non-negative.
pub fn lifespan() -> Decoder<i64> {
    min(&integer(), 0, true)
}

/// Weight in pounds, strictly positive.
pub fn weight() -> Decoder<f64> {
    min(&number(), 0.0, false)
}

pub fn lifecycle() -> Decoder<PlantLifecycle> {
    union(vec![
        literal("EVERGREEN").map(|_| PlantLifecycle::Evergreen),
        literal("DECIDUOUS").map(|_| PlantLifecycle::Deciduous),
        literal("SEMI_DECIDUOUS").map(|_| PlantLifecycle::SemiDeciduous),
    ])
}

// =============================================================================
// INPUTS
// =============================================================================

pub fn animal_input() -> Decoder<AnimalInput> {
    let name = name();
    let lifespan = lifespan();
    let weight = weight();
    let eaten_by = array(&animal_id());
    let diet = array(&living_thing_id());
    object(move |f| {
        let name = f.required("name", &name);
        let lifespan = f.required("lifespan", &lifespan);
        let weight = f.required("weight", &weight);
        let eaten_by = f.required("eatenBy", &eaten_by);
        let diet = f.required("diet", &diet);
        Some(AnimalInput {
            name: name?,
            lifespan: lifespan?,
            weight: weight?,
            eaten_by: eaten_by?,
            diet: diet?,
        })
    })
}

pub fn plant_input() -> Decoder<PlantInput> {
    let name = name();
    let lifespan = lifespan();
    let weight = weight();
    let lifecycle = lifecycle();
    let eaten_by = array(&animal_id());
    object(move |f| {
        let name = f.required("name", &name);
        let lifespan = f.required("lifespan", &lifespan);
        let weight = f.required("weight", &weight);
        let lifecycle = f.required("lifecycle", &lifecycle);
        let eaten_by = f.required("eatenBy", &eaten_by);
        Some(PlantInput {
            name: name?,
            lifespan: lifespan?,
            weight: weight?,
            lifecycle: lifecycle?,
            eaten_by: eaten_by?,
        })
    })
}

/// An object carrying exactly one of `animal`/`plant`.
pub fn living_thing_input() -> Decoder<LivingThingInput> {
    let animal = animal_input();
    let plant = plant_input();
    object(move |f| {
        let animal = f.optional("animal", &animal);
        let plant = f.optional("plant", &plant);
        match (animal, plant) {
            (Some(Some(animal)), Some(None)) => Some(LivingThingInput::Animal(animal)),
            (Some(None), Some(Some(plant))) => Some(LivingThingInput::Plant(plant)),
            (Some(None), Some(None)) | (Some(Some(_)), Some(Some(_))) => {
                f.reject("invalid_count");
                None
            }
            // A variant failed to decode; its failure is already recorded.
            _ => None,
        }
    })
}

// =============================================================================
// ROWS
// =============================================================================

/// Persisted animal shape: input minus the graph-only fields.
pub fn animal_row() -> Decoder<Animal> {
    let name = name();
    let lifespan = lifespan();
    let weight = weight();
    object(move |f| {
        let name = f.required("name", &name);
        let lifespan = f.required("lifespan", &lifespan);
        let weight = f.required("weight", &weight);
        Some(Animal {
            name: name?,
            lifespan: lifespan?,
            weight: weight?,
        })
    })
}

/// Persisted plant shape.
pub fn plant_row() -> Decoder<Plant> {
    let name = name();
    let lifespan = lifespan();
    let weight = weight();
    let lifecycle = lifecycle();
    object(move |f| {
        let name = f.required("name", &name);
        let lifespan = f.required("lifespan", &lifespan);
        let weight = f.required("weight", &weight);
        let lifecycle = f.required("lifecycle", &lifecycle);
        Some(Plant {
            name: name?,
            lifespan: lifespan?,
            weight: weight?,
            lifecycle: lifecycle?,
        })
    })
}

// =============================================================================
// PATCHES
// =============================================================================

pub fn animal_patch() -> Decoder<AnimalPatch> {
    let name = name();
    let lifespan = lifespan();
    let weight = weight();
    let diet = array(&living_thing_id());
    let eaten_by = array(&animal_id());
    object(move |f| {
        let name = f.optional("name", &name);
        let lifespan = f.optional("lifespan", &lifespan);
        let weight = f.optional("weight", &weight);
        let diet = f.optional("diet", &diet);
        let eaten_by = f.optional("eatenBy", &eaten_by);
        Some(AnimalPatch {
            name: name?,
            lifespan: lifespan?,
            weight: weight?,
            diet: diet?,
            eaten_by: eaten_by?,
        })
    })
}

pub fn plant_patch() -> Decoder<PlantPatch> {
    let name = name();
    let lifespan = lifespan();
    let weight = weight();
    let lifecycle = lifecycle();
    let eaten_by = array(&animal_id());
    object(move |f| {
        let name = f.optional("name", &name);
        let lifespan = f.optional("lifespan", &lifespan);
        let weight = f.optional("weight", &weight);
        let lifecycle = f.optional("lifecycle", &lifecycle);
        let eaten_by = f.optional("eatenBy", &eaten_by);
        Some(PlantPatch {
            name: name?,
            lifespan: lifespan?,
            weight: weight?,
            lifecycle: lifecycle?,
            eaten_by: eaten_by?,
        })
    })
}

/// Row-level animal patch, for the table's shallow merge.
pub fn animal_row_patch() -> Decoder<AnimalRowPatch> {
    let name = name();
    let lifespan = lifespan();
    let weight = weight();
    object(move |f| {
        let name = f.optional("name", &name);
        let lifespan = f.optional("lifespan", &lifespan);
        let weight = f.optional("weight", &weight);
        Some(AnimalRowPatch {
            name: name?,
            lifespan: lifespan?,
            weight: weight?,
        })
    })
}

/// Row-level plant patch.
pub fn plant_row_patch() -> Decoder<PlantRowPatch> {
    let name = name();
    let lifespan = lifespan();
    let weight = weight();
    let lifecycle = lifecycle();
    object(move |f| {
        let name = f.optional("name", &name);
        let lifespan = f.optional("lifespan", &lifespan);
        let weight = f.optional("weight", &weight);
        let lifecycle = f.optional("lifecycle", &lifecycle);
        Some(PlantRowPatch {
            name: name?,
            lifespan: lifespan?,
            weight: weight?,
            lifecycle: lifecycle?,
        })
    })
}

/// An object carrying exactly one of `animal`/`plant` patch variants.
pub fn living_thing_patch() -> Decoder<LivingThingPatch> {
    let animal = animal_patch();
    let plant = plant_patch();
    object(move |f| {
        let animal = f.optional("animal", &animal);
        let plant = f.optional("plant", &plant);
        match (animal, plant) {
            (Some(Some(animal)), Some(None)) => Some(LivingThingPatch::Animal(animal)),
            (Some(None), Some(Some(plant))) => Some(LivingThingPatch::Plant(plant)),
            (Some(None), Some(None)) | (Some(Some(_)), Some(Some(_))) => {
                f.reject("invalid_count");
                None
            }
            _ => None,
        }
    })
}

// =============================================================================
// ARGUMENTS
// =============================================================================

pub fn living_thing_args() -> Decoder<LivingThingArgs> {
    let id = living_thing_id();
    object(move |f| {
        let id = f.required("id", &id);
        Some(LivingThingArgs { id: id? })
    })
}

pub fn update_living_thing_args() -> Decoder<UpdateLivingThingArgs> {
    let id = living_thing_id();
    let patch = living_thing_patch();
    object(move |f| {
        let id = f.required("id", &id);
        let patch = f.required("patch", &patch);
        Some(UpdateLivingThingArgs {
            id: id?,
            patch: patch?,
        })
    })
}

pub fn delete_living_thing_args() -> Decoder<DeleteLivingThingArgs> {
    let id = living_thing_id();
    object(move |f| {
        let id = f.required("id", &id);
        Some(DeleteLivingThingArgs { id: id? })
    })
}

pub fn all_living_things_args() -> Decoder<AllLivingThingsArgs> {
    let page = min(&integer(), 0, true);
    object(move |f| {
        let page = f.required("page", &page);
        Some(AllLivingThingsArgs { page: page? })
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::report::payload::decode_code;
    use crate::report::report;

    fn animal_json(diet: serde_json::Value) -> serde_json::Value {
        json!({
            "name": "Deer",
            "lifespan": 4000,
            "weight": 150.0,
            "eatenBy": [],
            "diet": diet,
        })
    }

    #[test]
    fn test_animal_input_decodes() {
        let plant = GlobalId::new(Table::Plant, 0);
        let decoded = animal_input()
            .decode(&animal_json(json!([plant.token()])))
            .unwrap();
        assert_eq!(decoded.name, "Deer");
        assert_eq!(decoded.diet, vec![plant]);
        assert!(decoded.eaten_by.is_empty());
    }

    #[test]
    fn test_bad_token_reports_generic_code() {
        let reports = report(&animal_input().decode(&animal_json(json!(["garbage!!"]))));
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].path, vec!["diet".to_string(), "0".to_string()]);
        // One generic code per union alternative; the structured id error
        // stays server-side.
        assert!(reports[0].errors.iter().all(|code| code == "invalid"));
    }

    #[test]
    fn test_eaten_by_rejects_plant_tokens() {
        let plant = GlobalId::new(Table::Plant, 2);
        let input = json!({
            "name": "Deer",
            "lifespan": 4000,
            "weight": 150.0,
            "eatenBy": [plant.token()],
            "diet": [],
        });
        let reports = report(&animal_input().decode(&input));
        assert_eq!(reports.len(), 1);
        assert_eq!(
            reports[0].path,
            vec!["eatenBy".to_string(), "0".to_string()]
        );
        assert_eq!(reports[0].errors, vec!["not_animal".to_string()]);
    }

    #[test]
    fn test_name_bounds_carry_rich_params() {
        let input = json!({
            "name": "",
            "lifespan": 4000,
            "weight": 150.0,
            "eatenBy": [],
            "diet": [],
        });
        let reports = report(&animal_input().decode(&input));
        assert_eq!(reports.len(), 1);
        let payload = decode_code(&reports[0].errors[0]).unwrap();
        assert_eq!(payload.code, "too_short");
        assert!(payload.client);
        assert_eq!(payload.params.get("minLength"), Some(&"1".to_string()));
    }

    #[test]
    fn test_weight_must_be_positive() {
        let input = json!({
            "name": "Deer",
            "lifespan": 4000,
            "weight": 0,
            "eatenBy": [],
            "diet": [],
        });
        let reports = report(&animal_input().decode(&input));
        assert_eq!(reports[0].path, vec!["weight".to_string()]);
        let payload = decode_code(&reports[0].errors[0]).unwrap();
        assert_eq!(payload.code, "too_small");
        assert_eq!(payload.params.get("inclusive"), Some(&"false".to_string()));
    }

    #[test]
    fn test_lifecycle_union_surfaces_all_literals() {
        let reports = report(&lifecycle().decode(&json!("ANNUAL")));
        assert_eq!(reports.len(), 1);
        assert_eq!(
            reports[0].errors,
            vec![
                "EVERGREEN".to_string(),
                "DECIDUOUS".to_string(),
                "SEMI_DECIDUOUS".to_string(),
            ]
        );
    }

    #[test]
    fn test_living_thing_input_requires_exactly_one_variant() {
        let neither = report(&living_thing_input().decode(&json!({})));
        assert_eq!(neither.len(), 1);
        assert_eq!(neither[0].errors, vec!["invalid_count".to_string()]);

        let plant = json!({
            "name": "Fern",
            "lifespan": 700,
            "weight": 0.5,
            "lifecycle": "EVERGREEN",
            "eatenBy": [],
        });
        let both = report(&living_thing_input().decode(&json!({
            "animal": animal_json(json!([])),
            "plant": plant.clone(),
        })));
        assert_eq!(both.len(), 1);
        assert_eq!(both[0].errors, vec!["invalid_count".to_string()]);

        let one = living_thing_input()
            .decode(&json!({ "plant": plant }))
            .unwrap();
        assert!(matches!(one, LivingThingInput::Plant(_)));
    }

    #[test]
    fn test_patch_fields_all_optional() {
        let decoded = animal_patch().decode(&json!({ "weight": 12.5 })).unwrap();
        assert_eq!(decoded.weight, Some(12.5));
        assert_eq!(decoded.name, None);
        assert_eq!(decoded.diet, None);
    }

    #[test]
    fn test_patch_null_means_absent() {
        let decoded = animal_patch()
            .decode(&json!({ "name": null, "lifespan": 10 }))
            .unwrap();
        assert_eq!(decoded.name, None);
        assert_eq!(decoded.lifespan, Some(10));
    }

    #[test]
    fn test_living_thing_args_accept_either_table() {
        let animal = GlobalId::new(Table::Animal, 4);
        let plant = GlobalId::new(Table::Plant, 4);
        for id in [animal, plant] {
            let decoded = living_thing_args()
                .decode(&json!({ "id": id.token() }))
                .unwrap();
            assert_eq!(decoded.id, id);
        }
    }

    #[test]
    fn test_paging_args_reject_negative_pages() {
        assert_eq!(
            all_living_things_args()
                .decode(&json!({ "page": 2 }))
                .unwrap()
                .page,
            2
        );
        let reports = report(&all_living_things_args().decode(&json!({ "page": -1 })));
        let payload = decode_code(&reports[0].errors[0]).unwrap();
        assert_eq!(payload.code, "too_small");
    }

    #[test]
    fn test_update_args_reject_bad_patch_ids() {
        let animal = GlobalId::new(Table::Animal, 0);
        let args = json!({
            "id": animal.token(),
            "patch": { "animal": { "eatenBy": ["nonsense"] } },
        });
        let reports = report(&update_living_thing_args().decode(&args));
        assert_eq!(reports.len(), 1);
        assert_eq!(
            reports[0].path,
            vec![
                "patch".to_string(),
                "animal".to_string(),
                "eatenBy".to_string(),
                "0".to_string(),
            ]
        );
    }
}
