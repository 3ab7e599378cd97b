//! `IndexedDB` storage engine for the history store.
//!
//! Wraps the callback-based `IndexedDB` API into the futures the
//! [`StorageEngine`] seam expects: every `IdbRequest` becomes a promise
//! resolved from its `success` event, and each transaction carries a
//! promise resolved from its `complete` event, which is what
//! [`Transaction::commit`] awaits.
//!
//! Records are stored as plain objects so the database stays readable
//! from dev tools:
//!
//! ```text
//! { id: 7, thumbnailData: Uint8Array, highQualityData: Uint8Array, timestamp: 1718000000000 }
//! ```
//!
//! All functions in this module require a browser environment
//! (`wasm32-unknown-unknown` target).

use std::marker::PhantomData;

use halo_compose::EncodedImage;
use halo_compose::history::{
    Database, EngineError, HistoryRecord, RecordId, Schema, StorageEngine, StoredRecord,
    Transaction, TxMode,
};
use js_sys::{Object, Reflect, Uint8Array};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{
    Event, IdbDatabase, IdbFactory, IdbObjectStore, IdbObjectStoreParameters, IdbOpenDbRequest,
    IdbRequest, IdbTransactionMode,
};

const KEY_PATH: &str = "id";
const THUMBNAIL_FIELD: &str = "thumbnailData";
const FULL_FIELD: &str = "highQualityData";
const TIMESTAMP_FIELD: &str = "timestamp";

/// Opens the history database through `window.indexedDB`.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdbEngine;

impl StorageEngine for IdbEngine {
    type Database = IdbHistoryDb;

    async fn open(&self, schema: &Schema) -> Result<IdbHistoryDb, EngineError> {
        let factory = idb_factory().map_err(to_engine_error)?;
        let request = factory
            .open_with_u32(schema.name, schema.version)
            .map_err(to_engine_error)?;
        attach_upgrade_handler(&request, schema.collection);
        let db = JsFuture::from(request_to_promise(request.into()))
            .await
            .map_err(to_engine_error)?
            .dyn_into::<IdbDatabase>()
            .map_err(to_engine_error)?;
        if !db.object_store_names().contains(schema.collection) {
            db.close();
            return Err(EngineError::new(format!(
                "database {} has no {} store",
                schema.name, schema.collection
            )));
        }
        Ok(IdbHistoryDb {
            db,
            collection: schema.collection,
        })
    }
}

/// An open history database.
#[derive(Debug)]
pub struct IdbHistoryDb {
    db: IdbDatabase,
    collection: &'static str,
}

impl Database for IdbHistoryDb {
    type Transaction<'a> = IdbHistoryTx<'a>;

    fn transaction(&self, mode: TxMode) -> Result<IdbHistoryTx<'_>, EngineError> {
        let idb_mode = match mode {
            TxMode::ReadOnly => IdbTransactionMode::Readonly,
            TxMode::ReadWrite => IdbTransactionMode::Readwrite,
        };
        let tx = self
            .db
            .transaction_with_str_and_mode(self.collection, idb_mode)
            .map_err(to_engine_error)?;
        // Listen for completion before any request is issued so the
        // `complete` event cannot be missed.
        let done = JsFuture::from(transaction_to_promise(&tx));
        let store = tx.object_store(self.collection).map_err(to_engine_error)?;
        Ok(IdbHistoryTx {
            tx,
            store,
            done: Some(done),
            _db: PhantomData,
        })
    }
}

/// A live `IndexedDB` transaction. Aborted on drop unless committed.
pub struct IdbHistoryTx<'a> {
    tx: web_sys::IdbTransaction,
    store: IdbObjectStore,
    done: Option<JsFuture>,
    _db: PhantomData<&'a IdbHistoryDb>,
}

impl Transaction for IdbHistoryTx<'_> {
    async fn add(&mut self, record: StoredRecord) -> Result<RecordId, EngineError> {
        let value = record_to_js(&record).map_err(to_engine_error)?;
        let request = self.store.add(&value).map_err(to_engine_error)?;
        let key = await_request(request).await?;
        key_to_id(&key)
    }

    async fn keys(&mut self) -> Result<Vec<RecordId>, EngineError> {
        let request = self.store.get_all_keys().map_err(to_engine_error)?;
        let keys = await_request(request).await?;
        js_sys::Array::from(&keys)
            .iter()
            .map(|key| key_to_id(&key))
            .collect()
    }

    async fn records(&mut self) -> Result<Vec<HistoryRecord>, EngineError> {
        let request = self.store.get_all().map_err(to_engine_error)?;
        let values = await_request(request).await?;
        js_sys::Array::from(&values)
            .iter()
            .map(|value| record_from_js(&value))
            .collect()
    }

    async fn get(&mut self, id: RecordId) -> Result<Option<HistoryRecord>, EngineError> {
        let request = self.store.get(&id_to_key(id)).map_err(to_engine_error)?;
        let value = await_request(request).await?;
        if value.is_undefined() || value.is_null() {
            return Ok(None);
        }
        record_from_js(&value).map(Some)
    }

    async fn delete(&mut self, id: RecordId) -> Result<(), EngineError> {
        let request = self.store.delete(&id_to_key(id)).map_err(to_engine_error)?;
        await_request(request).await.map(drop)
    }

    async fn clear(&mut self) -> Result<(), EngineError> {
        let request = self.store.clear().map_err(to_engine_error)?;
        await_request(request).await.map(drop)
    }

    async fn commit(mut self) -> Result<(), EngineError> {
        // IndexedDB commits on its own once no requests are pending.
        match self.done.take() {
            Some(done) => done.await.map(drop).map_err(to_engine_error),
            None => Ok(()),
        }
    }
}

impl Drop for IdbHistoryTx<'_> {
    fn drop(&mut self) {
        if self.done.is_some() {
            // Already finished transactions reject the abort; nothing to undo then.
            let _ = self.tx.abort();
        }
    }
}

/// Render a rejected promise or thrown value as a message.
pub fn js_err(error: &JsValue) -> String {
    if let Some(value) = error.as_string() {
        return value;
    }
    if let Some(exception) = error.dyn_ref::<web_sys::DomException>() {
        return format!("{}: {}", exception.name(), exception.message());
    }
    if let Ok(json) = js_sys::JSON::stringify(error)
        && let Some(value) = json.as_string()
    {
        return value;
    }
    "js error".to_owned()
}

fn to_engine_error(error: JsValue) -> EngineError {
    EngineError::new(js_err(&error))
}

fn idb_factory() -> Result<IdbFactory, JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("missing window"))?;
    window
        .indexed_db()?
        .ok_or_else(|| JsValue::from_str("indexeddb unavailable"))
}

fn attach_upgrade_handler(request: &IdbOpenDbRequest, collection: &'static str) {
    let request_for_cb = request.clone();
    let on_upgrade = wasm_bindgen::closure::Closure::once(move |_event: Event| {
        let Ok(result) = request_for_cb.result() else {
            return;
        };
        let Ok(db) = result.dyn_into::<IdbDatabase>() else {
            return;
        };
        if db.object_store_names().contains(collection) {
            return;
        }
        let params = IdbObjectStoreParameters::new();
        params.set_key_path(&JsValue::from_str(KEY_PATH));
        params.set_auto_increment(true);
        if let Err(e) = db.create_object_store_with_optional_parameters(collection, &params) {
            web_sys::console::error_1(&e);
            // Aborting the versionchange transaction rejects the open request.
            if let Some(tx) = request_for_cb.transaction() {
                let _ = tx.abort();
            }
        }
    });
    request.set_onupgradeneeded(Some(on_upgrade.as_ref().unchecked_ref()));
    on_upgrade.forget();
}

fn request_to_promise(request: IdbRequest) -> js_sys::Promise {
    js_sys::Promise::new(&mut |resolve, reject| {
        let success_request = request.clone();
        let error_request = request.clone();
        let on_success = wasm_bindgen::closure::Closure::once(move |_event: Event| {
            let result = success_request.result().unwrap_or(JsValue::UNDEFINED);
            let _ = resolve.call1(&JsValue::NULL, &result);
        });
        let on_error = wasm_bindgen::closure::Closure::once(move |_event: Event| {
            let reason = error_request
                .error()
                .ok()
                .flatten()
                .map_or_else(|| "indexeddb request failed".to_owned(), |e| e.message());
            let _ = reject.call1(&JsValue::NULL, &JsValue::from_str(&reason));
        });
        request.set_onsuccess(Some(on_success.as_ref().unchecked_ref()));
        request.set_onerror(Some(on_error.as_ref().unchecked_ref()));
        on_success.forget();
        on_error.forget();
    })
}

fn transaction_to_promise(tx: &web_sys::IdbTransaction) -> js_sys::Promise {
    js_sys::Promise::new(&mut |resolve, reject| {
        let reject_on_abort = reject.clone();
        let error_tx = tx.clone();
        let on_complete = wasm_bindgen::closure::Closure::once(move |_event: Event| {
            let _ = resolve.call0(&JsValue::NULL);
        });
        let on_error = wasm_bindgen::closure::Closure::once(move |_event: Event| {
            let reason = error_tx
                .error()
                .map_or_else(|| "indexeddb transaction failed".to_owned(), |e| e.message());
            let _ = reject.call1(&JsValue::NULL, &JsValue::from_str(&reason));
        });
        let on_abort = wasm_bindgen::closure::Closure::once(move |_event: Event| {
            let _ = reject_on_abort.call1(
                &JsValue::NULL,
                &JsValue::from_str("indexeddb transaction aborted"),
            );
        });
        tx.set_oncomplete(Some(on_complete.as_ref().unchecked_ref()));
        tx.set_onerror(Some(on_error.as_ref().unchecked_ref()));
        tx.set_onabort(Some(on_abort.as_ref().unchecked_ref()));
        on_complete.forget();
        on_error.forget();
        on_abort.forget();
    })
}

async fn await_request(request: IdbRequest) -> Result<JsValue, EngineError> {
    JsFuture::from(request_to_promise(request))
        .await
        .map_err(to_engine_error)
}

#[allow(clippy::cast_precision_loss)]
fn id_to_key(id: RecordId) -> JsValue {
    JsValue::from_f64(id.0 as f64)
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn key_to_id(key: &JsValue) -> Result<RecordId, EngineError> {
    key.as_f64()
        .filter(|k| k.is_finite() && *k >= 0.0 && k.fract() == 0.0)
        .map(|k| RecordId(k as u64))
        .ok_or_else(|| EngineError::new(format!("unexpected record key: {}", js_err(key))))
}

#[allow(clippy::cast_precision_loss)]
fn record_to_js(record: &StoredRecord) -> Result<JsValue, JsValue> {
    let obj = Object::new();
    Reflect::set(
        &obj,
        &JsValue::from_str(THUMBNAIL_FIELD),
        &Uint8Array::from(record.thumbnail.as_bytes()),
    )?;
    Reflect::set(
        &obj,
        &JsValue::from_str(FULL_FIELD),
        &Uint8Array::from(record.full.as_bytes()),
    )?;
    Reflect::set(
        &obj,
        &JsValue::from_str(TIMESTAMP_FIELD),
        &JsValue::from_f64(record.timestamp as f64),
    )?;
    Ok(obj.into())
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn record_from_js(value: &JsValue) -> Result<HistoryRecord, EngineError> {
    let field = |name: &str| Reflect::get(value, &JsValue::from_str(name)).map_err(to_engine_error);
    let bytes = |name: &str| -> Result<EncodedImage, EngineError> {
        let v = field(name)?;
        let array = v
            .dyn_into::<Uint8Array>()
            .map_err(|_| EngineError::new(format!("record field {name} is not a byte array")))?;
        Ok(EncodedImage::new(array.to_vec()))
    };

    let id = key_to_id(&field(KEY_PATH)?)?;
    let timestamp = field(TIMESTAMP_FIELD)?
        .as_f64()
        .filter(|t| t.is_finite() && *t >= 0.0)
        .ok_or_else(|| EngineError::new("record has no timestamp"))? as u64;
    Ok(HistoryRecord {
        id,
        thumbnail: bytes(THUMBNAIL_FIELD)?,
        full: bytes(FULL_FIELD)?,
        timestamp,
    })
}
