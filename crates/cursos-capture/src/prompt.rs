//! The fixed instruction sent with every document image.

/// Asks for a bare JSON object with the six wire keys of
/// [`cursos_core::profile::ExtractionResult`], `null` for illegible fields.
pub const EXTRACTION_PROMPT: &str = r#"Analise este documento de identidade brasileiro. Ele pode ser uma CNH ou um RG.
Extraia os dados abaixo e responda SOMENTE com um objeto JSON válido, sem texto adicional e sem blocos de código markdown.
Use exatamente estas chaves:
{
  "tipo_documento": "CNH ou RG",
  "nome_completo": "",
  "cpf": "",
  "data_nascimento": "dd/mm/aaaa",
  "nome_mae": "",
  "numero_registro": ""
}
Se algum campo estiver ilegível, use null como valor em vez de omitir a chave."#;

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn names_every_wire_key() {
    for key in [
      "tipo_documento",
      "nome_completo",
      "cpf",
      "data_nascimento",
      "nome_mae",
      "numero_registro",
    ] {
      assert!(EXTRACTION_PROMPT.contains(&format!("\"{key}\"")), "{key}");
    }
  }
}
