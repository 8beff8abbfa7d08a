use wasm_bindgen::prelude::*;

use crate::vfs::VirtualFileSystem;

/// Convert the markup descriptors of a document definition object and
/// return the converted object.
#[wasm_bindgen(js_name = setDocumentDefinition)]
pub fn set_document_definition(doc_definition: JsValue) -> Result<JsValue, JsValue> {
    let mut doc: serde_json::Value = serde_wasm_bindgen::from_value(doc_definition)?;
    crate::set_document_definition(&mut doc).map_err(|e| JsValue::from_str(&e.to_string()))?;
    Ok(serde_wasm_bindgen::to_value(&doc)?)
}

/// Browser-side handle to the virtual filesystem.
#[wasm_bindgen(js_name = VirtualFileSystem)]
pub struct WasmFileSystem {
    inner: VirtualFileSystem,
}

#[wasm_bindgen(js_class = VirtualFileSystem)]
impl WasmFileSystem {
    #[wasm_bindgen(constructor)]
    pub fn new() -> WasmFileSystem {
        WasmFileSystem {
            inner: VirtualFileSystem::new(),
        }
    }

    #[wasm_bindgen(js_name = readFileSync)]
    pub fn read_file(&self, filename: &str) -> Result<Option<Vec<u8>>, JsValue> {
        self.inner
            .read_file(filename)
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    #[wasm_bindgen(js_name = writeFileSync)]
    pub fn write_file(&mut self, filename: &str, content: Vec<u8>) {
        self.inner.write_file(filename, content);
    }

    #[wasm_bindgen(js_name = bindFS)]
    pub fn bind_fs(&mut self, data: JsValue) -> Result<(), JsValue> {
        self.inner.bind_fs(serde_wasm_bindgen::from_value(data)?);
        Ok(())
    }
}

impl Default for WasmFileSystem {
    fn default() -> Self {
        Self::new()
    }
}
