//! Recipe documents as they enter the index

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// One recipe from the source dataset.
///
/// Field names follow the dataset; the payload written to the index uses
/// the longer names expected by the prompt template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeDocument {
    pub id: u64,
    pub name: String,
    /// Difficulty tier ("Easy", "More effort", ...)
    pub difficult: String,
    pub dish_type: String,
    #[serde(default)]
    pub description: String,
    pub ingredients: Vec<String>,
    pub steps: Vec<String>,
    pub prep_mins: f64,
    pub cook_mins: f64,
    pub total_mins: f64,
    pub kcal: f64,
    pub fat: f64,
    pub saturates: f64,
    pub carbs: f64,
    pub sugars: f64,
    pub fibre: f64,
    pub protein: f64,
    pub salt: f64,
    #[serde(rename = "rattings")]
    pub rating: f64,
}

impl RecipeDocument {
    /// Text both the dense and the sparse representation are computed from
    pub fn index_text(&self) -> String {
        format!(
            "{} | {} | {} | {} | {}",
            self.name,
            self.difficult,
            self.dish_type,
            self.description,
            self.ingredients.join(";")
        )
    }

    /// Payload stored alongside the vectors
    pub fn payload(&self) -> Map<String, Value> {
        let value = json!({
            "id": self.id,
            "name": self.name,
            "dish_type": self.dish_type,
            "difficult": self.difficult,
            "ingredients": self.ingredients,
            "steps": self.steps,
            "preparation_min": self.prep_mins,
            "cooking_min": self.cook_mins,
            "total_cooking_min": self.total_mins,
            "kcal": self.kcal,
            "fat": self.fat,
            "saturated_fat": self.saturates,
            "carbohydrates": self.carbs,
            "sugars": self.sugars,
            "fibre": self.fibre,
            "protein": self.protein,
            "salt": self.salt,
            "rating": self.rating,
        });

        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }
}

#[cfg(test)]
pub(crate) fn sample_recipe(id: u64, name: &str) -> RecipeDocument {
    RecipeDocument {
        id,
        name: name.to_string(),
        difficult: "Easy".to_string(),
        dish_type: "Biscuits".to_string(),
        description: format!("A simple {}", name.to_lowercase()),
        ingredients: vec!["200g flour".to_string(), "100g butter".to_string()],
        steps: vec!["Mix everything.".to_string(), "Bake for 12 mins.".to_string()],
        prep_mins: 10.0,
        cook_mins: 12.0,
        total_mins: 22.0,
        kcal: 180.0,
        fat: 9.0,
        saturates: 5.0,
        carbs: 22.0,
        sugars: 11.0,
        fibre: 1.0,
        protein: 2.0,
        salt: 0.2,
        rating: 4.5,
    }
}
