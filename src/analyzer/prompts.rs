//! Prompt text sent to the model. The requested JSON shapes must stay in
//! sync with the field names read in `normalize`.

const ANALYSIS_SCHEMA: &str = r#"{
    "food_name": "specific name of the dish",
    "calories": total kilocalories as a number,
    "protein": protein in grams as a number,
    "carbs": carbohydrates in grams as a number,
    "fat": fat in grams as a number,
    "food_score": nutrient density from 1 to 10 (10 = salmon, broccoli, quinoa; 1 = candy, soda),
    "health_benefits": ["benefit", "..."],
    "health_negatives": ["drawback", "..."],
    "portion_estimate": "portion size, e.g. '1 cup', '250g', '1 medium plate'"
}"#;

pub fn image_analysis() -> String {
    format!(
        "You are a nutritionist estimating the contents of a meal photo.\n\
         Reply with a single JSON object containing exactly these fields:\n\n\
         {ANALYSIS_SCHEMA}\n\n\
         Rules:\n\
         - Base calories on the portion that is visible.\n\
         - List 2-5 health benefits and 1-3 health negatives.\n\
         - Output only the JSON object: no markdown fences, no commentary."
    )
}

pub fn text_analysis(query: &str) -> String {
    format!(
        "You are a nutritionist estimating a meal from its description:\n\n\
         \"{query}\"\n\n\
         Reply with a single JSON object containing exactly these fields:\n\n\
         {ANALYSIS_SCHEMA}\n\n\
         Rules:\n\
         - Honor any quantity in the description (\"200g\", \"2 cups\", \"1 large\").\n\
         - Without a quantity, assume one standard serving.\n\
         - List 2-5 health benefits and 1-3 health negatives.\n\
         - Output only the JSON object: no markdown fences, no commentary."
    )
}

pub fn meal_suggestions(remaining_calories: i64, recent_food_names: &[String]) -> String {
    let recent = if recent_food_names.is_empty() {
        "none yet".to_string()
    } else {
        recent_food_names.join(", ")
    };
    format!(
        "I have {remaining_calories} calories remaining for today.\n\
         Meals so far today: {recent}.\n\n\
         Suggest 3 healthy meals that each fit within {remaining_calories} calories \
         and add variety to what I already ate.\n\n\
         Reply with a JSON array of objects with these keys:\n\
         - name: meal name\n\
         - calories: estimated kilocalories (number)\n\
         - protein: estimated protein in grams (number)\n\
         - reason: one sentence on why it fits\n\n\
         Output only the JSON array: no markdown fences, no commentary."
    )
}
