//! LibXML2 FFI Wrapper Module
//!
//! Safe wrapper around the libxml2 calls needed to compile one XSD schema and
//! validate one XML document against it.
//!
//! The Rust ecosystem has no mature XSD validator, so schema validation is
//! delegated to the system libxml2 through direct FFI. Everything unsafe stays
//! in this module:
//!
//! - schemas and validation contexts are freed by RAII owners
//! - libxml2 diagnostics are captured through structured error handlers
//!   instead of being printed, so the caller decides what reaches the console
//! - parser initialisation runs exactly once per process

use std::ffi::{CStr, CString};
use std::marker::PhantomData;
use std::path::Path;
use std::ptr;
use std::rc::Rc;
use std::sync::Once;

use libc::{c_char, c_int, c_void};

use crate::error::{LibXml2Error, LibXml2Result, ValidatorError};
use crate::validator::{Schema, SchemaFactory, Validator};

/// Global initialization flag for libxml2
///
/// libxml2's initialization functions are not thread-safe, so they are
/// guarded by `std::sync::Once`.
static LIBXML2_INIT: Once = Once::new();

/// `xmlErrorLevel::XML_ERR_ERROR`; warnings sit below it
const XML_ERR_ERROR: c_int = 2;

/// `xmlErrorDomain::XML_FROM_PARSER`: the document is not well-formed
const XML_FROM_PARSER: c_int = 1;

/// `xmlErrorDomain::XML_FROM_IO`
const XML_FROM_IO: c_int = 8;

/// Opaque libxml2 structures
#[repr(C)]
pub struct XmlSchema {
    _private: [u8; 0],
}

#[repr(C)]
pub struct XmlSchemaParserCtxt {
    _private: [u8; 0],
}

#[repr(C)]
pub struct XmlSchemaValidCtxt {
    _private: [u8; 0],
}

#[repr(C)]
pub struct xmlError {
    pub domain: c_int,
    pub code: c_int,
    pub message: *const c_char,
    pub level: c_int,
    pub file: *const c_char,
    pub line: c_int,
    pub str1: *const c_char,
    pub str2: *const c_char,
    pub str3: *const c_char,
    pub int1: c_int,
    pub int2: c_int,
    pub ctxt: *mut c_void,
    pub node: *mut c_void,
}

pub type XmlStructuredErrorFunc = Option<unsafe extern "C" fn(user_data: *mut c_void, error: *mut xmlError)>;

// External libxml2 FFI declarations
#[cfg_attr(target_os = "windows", link(name = "libxml2"))]
#[cfg_attr(not(target_os = "windows"), link(name = "xml2"))]
unsafe extern "C" {
    pub fn xmlInitParser();
    pub fn xmlInitGlobals();

    pub fn xmlSetStructuredErrorFunc(ctx: *mut c_void, handler: XmlStructuredErrorFunc);

    // Schema parsing functions
    pub fn xmlSchemaNewParserCtxt(url: *const c_char) -> *mut XmlSchemaParserCtxt;
    pub fn xmlSchemaSetParserStructuredErrors(
        ctxt: *mut XmlSchemaParserCtxt,
        serror: XmlStructuredErrorFunc,
        ctx: *mut c_void,
    );
    pub fn xmlSchemaParse(ctxt: *const XmlSchemaParserCtxt) -> *mut XmlSchema;
    pub fn xmlSchemaFreeParserCtxt(ctxt: *mut XmlSchemaParserCtxt);
    pub fn xmlSchemaFree(schema: *mut XmlSchema);

    // Schema validation functions
    pub fn xmlSchemaNewValidCtxt(schema: *const XmlSchema) -> *mut XmlSchemaValidCtxt;
    pub fn xmlSchemaFreeValidCtxt(ctxt: *mut XmlSchemaValidCtxt);
    pub fn xmlSchemaSetValidStructuredErrors(
        ctxt: *mut XmlSchemaValidCtxt,
        serror: XmlStructuredErrorFunc,
        ctx: *mut c_void,
    );
    pub fn xmlSchemaValidateFile(ctxt: *mut XmlSchemaValidCtxt, filename: *const c_char, options: c_int) -> c_int;
}

/// One diagnostic reported by libxml2
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedError {
    pub domain: i32,
    pub level: i32,
    pub line: u32,
    pub column: u32,
    pub message: String,
}

/// Callback for libxml2 to report errors (structured)
unsafe extern "C" fn structured_error_callback(user_data: *mut c_void, error: *mut xmlError) {
    if user_data.is_null() || error.is_null() {
        return;
    }

    let errors = unsafe { &mut *(user_data as *mut Vec<CapturedError>) };
    let error = unsafe { &*error };

    let message = if error.message.is_null() {
        String::new()
    } else {
        unsafe { CStr::from_ptr(error.message) }
            .to_string_lossy()
            .trim()
            .to_string()
    };

    errors.push(CapturedError {
        domain: error.domain,
        level: error.level,
        line: u32::try_from(error.line).unwrap_or(0),
        column: u32::try_from(error.int2).unwrap_or(0),
        message,
    });
}

/// Collects libxml2 diagnostics while alive.
///
/// Installs the thread's structured error handler on creation and removes it
/// on drop, so nothing libxml2 reports in between is printed to stderr.
struct ErrorCapture {
    errors: Box<Vec<CapturedError>>,
}

impl ErrorCapture {
    fn install() -> Self {
        let mut capture = ErrorCapture {
            errors: Box::new(Vec::new()),
        };
        unsafe {
            xmlSetStructuredErrorFunc(capture.user_data(), Some(structured_error_callback));
        }
        capture
    }

    /// Pointer handed to libxml2; stable because the vector is boxed
    fn user_data(&mut self) -> *mut c_void {
        &mut *self.errors as *mut Vec<CapturedError> as *mut c_void
    }

    /// First error-level diagnostic, ignoring warnings
    fn first_error(&self) -> Option<&CapturedError> {
        self.errors.iter().find(|e| e.level >= XML_ERR_ERROR)
    }

    /// First diagnostic from the document reader, whatever its level
    fn first_read_error(&self) -> Option<&CapturedError> {
        self.errors
            .iter()
            .find(|e| e.domain == XML_FROM_PARSER || e.domain == XML_FROM_IO)
    }

    fn first_message(&self, fallback: &str) -> String {
        self.first_error()
            .map(|e| e.message.clone())
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| fallback.to_string())
    }
}

impl Drop for ErrorCapture {
    fn drop(&mut self) {
        unsafe {
            xmlSetStructuredErrorFunc(ptr::null_mut(), None);
        }
    }
}

fn path_to_cstring(path: &Path) -> LibXml2Result<CString> {
    path.to_str()
        .and_then(|s| CString::new(s).ok())
        .ok_or_else(|| LibXml2Error::InvalidPath(path.to_path_buf()))
}

/// Shared, reference-counted owner of a compiled schema
#[derive(Debug)]
pub struct XmlSchemaPtr {
    inner: Rc<XmlSchemaInner>,
}

#[derive(Debug)]
struct XmlSchemaInner {
    ptr: *mut XmlSchema,
    _phantom: PhantomData<XmlSchema>,
}

impl XmlSchemaPtr {
    /// Wrap a raw schema pointer
    ///
    /// # Safety
    ///
    /// The pointer must come from `xmlSchemaParse` and must not be freed by
    /// anyone else.
    pub(crate) unsafe fn from_raw(ptr: *mut XmlSchema) -> LibXml2Result<Self> {
        if ptr.is_null() {
            return Err(LibXml2Error::SchemaParseFailed);
        }

        Ok(XmlSchemaPtr {
            inner: Rc::new(XmlSchemaInner {
                ptr,
                _phantom: PhantomData,
            }),
        })
    }

    pub(crate) fn as_ptr(&self) -> *const XmlSchema {
        self.inner.ptr
    }
}

impl Clone for XmlSchemaPtr {
    fn clone(&self) -> Self {
        XmlSchemaPtr {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl Drop for XmlSchemaInner {
    fn drop(&mut self) {
        if !self.ptr.is_null() {
            unsafe {
                xmlSchemaFree(self.ptr);
            }
            self.ptr = ptr::null_mut();
        }
    }
}

/// Validation context bound to one compiled schema
#[derive(Debug)]
pub struct SchemaValidator {
    ctxt: *mut XmlSchemaValidCtxt,
    // Keeps the schema alive as long as the context points into it
    _schema: XmlSchemaPtr,
}

impl Drop for SchemaValidator {
    fn drop(&mut self) {
        unsafe {
            xmlSchemaFreeValidCtxt(self.ctxt);
        }
    }
}

impl Validator for SchemaValidator {
    /// Stream `xml` through the schema; stops at the first reported error.
    ///
    /// A diagnostic from the parser domain means the document is not
    /// well-formed and becomes `XmlParse`; anything else is a violation
    /// carrying the reader's line and column.
    fn validate(&mut self, xml: &Path) -> Result<(), ValidatorError> {
        let c_path = path_to_cstring(xml)?;
        let mut capture = ErrorCapture::install();

        let code = unsafe {
            xmlSchemaSetValidStructuredErrors(self.ctxt, Some(structured_error_callback), capture.user_data());
            xmlSchemaValidateFile(self.ctxt, c_path.as_ptr(), 0)
        };

        if code == 0 {
            return Ok(());
        }

        match capture.first_error() {
            Some(error) if error.domain == XML_FROM_PARSER || error.domain == XML_FROM_IO => {
                Err(ValidatorError::XmlParse(error.message.clone()))
            }
            Some(error) => Err(ValidatorError::Violation {
                line: error.line,
                column: error.column,
                message: error.message.clone(),
            }),
            // Unreadable input may only leave an I/O warning behind
            None => match capture.first_read_error() {
                Some(error) => Err(ValidatorError::XmlParse(error.message.clone())),
                None if code > 0 => Err(ValidatorError::Violation {
                    line: 0,
                    column: 0,
                    message: format!("{code} validation error(s)"),
                }),
                None => Err(LibXml2Error::ValidationFailed {
                    code,
                    file: xml.to_path_buf(),
                }
                .into()),
            },
        }
    }
}

impl Schema for XmlSchemaPtr {
    type Validator = SchemaValidator;

    fn new_validator(&self) -> Result<SchemaValidator, ValidatorError> {
        let ctxt = unsafe { xmlSchemaNewValidCtxt(self.as_ptr()) };
        if ctxt.is_null() {
            return Err(LibXml2Error::ValidationContextCreationFailed.into());
        }

        Ok(SchemaValidator {
            ctxt,
            _schema: self.clone(),
        })
    }
}

/// Entry point to libxml2's schema support
///
/// Creating one initialises the parser if that has not happened yet.
pub struct LibXml2Wrapper {
    _phantom: PhantomData<()>,
}

impl LibXml2Wrapper {
    pub fn new() -> Self {
        LIBXML2_INIT.call_once(|| unsafe {
            xmlInitParser();
            xmlInitGlobals();
        });

        LibXml2Wrapper { _phantom: PhantomData }
    }

    /// Compile the XSD at `xsd`; relative includes resolve against its location.
    ///
    /// # Errors
    ///
    /// Returns `ValidatorError::SchemaCompile` with libxml2's first error
    /// message if the schema is unreadable or invalid.
    pub fn parse_schema_file(&self, xsd: &Path) -> Result<XmlSchemaPtr, ValidatorError> {
        let c_path = path_to_cstring(xsd)?;
        let mut capture = ErrorCapture::install();

        unsafe {
            let parser_ctxt = xmlSchemaNewParserCtxt(c_path.as_ptr());
            if parser_ctxt.is_null() {
                return Err(LibXml2Error::MemoryAllocation.into());
            }

            xmlSchemaSetParserStructuredErrors(parser_ctxt, Some(structured_error_callback), capture.user_data());
            let schema_ptr = xmlSchemaParse(parser_ctxt);

            // Always free the parser context
            xmlSchemaFreeParserCtxt(parser_ctxt);

            if schema_ptr.is_null() {
                return Err(ValidatorError::SchemaCompile(
                    capture.first_message("schema could not be parsed"),
                ));
            }

            Ok(XmlSchemaPtr::from_raw(schema_ptr)?)
        }
    }
}

impl Default for LibXml2Wrapper {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaFactory for LibXml2Wrapper {
    type Schema = XmlSchemaPtr;

    fn new_schema(&self, xsd: &Path) -> Result<XmlSchemaPtr, ValidatorError> {
        self.parse_schema_file(xsd)
    }
}
