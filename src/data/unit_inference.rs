/// Infer a unit label from a value column name when the descriptor gives none.
pub fn infer_unit(column_name: &str) -> String {
    let lower = column_name.to_lowercase();

    if lower.contains("soil_water") || lower.contains("volumetric") {
        "m\u{00B3}/m\u{00B3}".to_string()
    } else if lower.contains("precip") || lower.contains("rain") {
        "mm".to_string()
    } else if lower.contains("bar") {
        "bar".to_string()
    } else if lower.contains("pressure") {
        "Pa".to_string()
    } else if lower.ends_with("_c") || lower.contains("celsius") {
        "\u{00B0}C".to_string()
    } else if lower.contains("temp") {
        "K".to_string()
    } else if lower.contains("count") {
        "count".to_string()
    } else if lower.contains("tide") || lower.contains("strain") || lower.contains("nstr") {
        "nstr".to_string()
    } else {
        "units".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::infer_unit;

    #[test]
    fn recognises_environmental_columns() {
        assert_eq!(infer_unit("pressure_bar"), "bar");
        assert_eq!(infer_unit("surface_pressure"), "Pa");
        assert_eq!(infer_unit("temperature_c"), "\u{00B0}C");
        assert_eq!(infer_unit("soil_temperature_level_1"), "K");
        assert_eq!(infer_unit("volumetric_soil_water_layer_1"), "m\u{00B3}/m\u{00B3}");
        assert_eq!(infer_unit("total_precip"), "mm");
        assert_eq!(infer_unit("tide_nstr"), "nstr");
        assert_eq!(infer_unit("mystery"), "units");
    }
}
