//! WASM module validation: `wasi_llm` import checks.
//!
//! Validates a compiled guest module against the bridge ABI before it is
//! instantiated. Every import from the `wasi_llm` module must:
//!
//! 1. Name a known host function
//! 2. Be a function import
//! 3. Have exactly the ABI signature
//!
//! Imports from other modules are left to the embedder's linker.

use wasmtime::{ExternType, FuncType, Module, ValType};

use wasi_llm_primitives::{find_host_function, AbiType, HostFunction, HOST_MODULE};

use crate::error::BridgeError;

fn matches_abi(vt: &ValType, expected: AbiType) -> bool {
    match expected {
        AbiType::I32 => matches!(vt, ValType::I32),
        AbiType::F32 => matches!(vt, ValType::F32),
    }
}

/// Validate that a WASM module's `wasi_llm` imports match the bridge ABI.
pub fn validate_module(module: &Module) -> Result<(), BridgeError> {
    for import in module.imports() {
        if import.module() != HOST_MODULE {
            continue;
        }
        let name = import.name();

        let expected = find_host_function(name).ok_or_else(|| {
            BridgeError::ValidationError(format!("unknown import: {}::{}", HOST_MODULE, name))
        })?;

        let func_ty = match import.ty() {
            ExternType::Func(ft) => ft,
            _ => {
                return Err(BridgeError::ValidationError(format!(
                    "non-function import not allowed: {}::{}",
                    HOST_MODULE, name
                )));
            }
        };

        check_signature(&func_ty, expected)?;
    }
    Ok(())
}

fn type_list(types: &[ValType]) -> String {
    let names: Vec<String> = types.iter().map(ToString::to_string).collect();
    format!("[{}]", names.join(", "))
}

fn check_signature(func_ty: &FuncType, expected: &HostFunction) -> Result<(), BridgeError> {
    let params: Vec<ValType> = func_ty.params().collect();
    let results: Vec<ValType> = func_ty.results().collect();

    let params_ok = params.len() == expected.params.len()
        && params
            .iter()
            .zip(expected.params)
            .all(|(vt, abi)| matches_abi(vt, *abi));
    if !params_ok {
        return Err(BridgeError::ValidationError(format!(
            "import '{}' has wrong param signature: expected {:?}, got {}",
            expected.name,
            expected.params,
            type_list(&params)
        )));
    }

    let results_ok = results.len() == 1 && matches_abi(&results[0], expected.result);
    if !results_ok {
        return Err(BridgeError::ValidationError(format!(
            "import '{}' has wrong result signature: expected one {:?} result, got {}",
            expected.name,
            expected.result,
            type_list(&results)
        )));
    }

    Ok(())
}
