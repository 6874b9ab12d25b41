// Copyright (c) 2017-present PyO3 Project and Contributors

//! The handle types: borrowed [`Object`], checked [`NonNullObject`], owning [`Owned`] and the
//! GIL-independent [`Py`].

use crate::err::PyResult;
use crate::type_object::PyTypeCheck;
use crate::types::any::AnyMethods;
use crate::types::string::StringMethods;
use crate::types::typeobject::TypeMethods;
use crate::types::PyAny;
use crate::{ffi, gil, PyErr, Python};
use std::fmt;
use std::marker::PhantomData;
use std::mem::ManuallyDrop;
use std::ops::Deref;
use std::ptr::{self, NonNull};

/// Returns a borrowed pointer to a Python object.
///
/// The returned pointer will be valid for as long as `self` is. It may be null depending on the
/// implementation.
///
/// # Safety
///
/// Implementors must return either null or a pointer to a live Python object, and
/// [`is_nonnull`](AsPyPointer::is_nonnull) must only return `true` when the pointer is non-null.
pub unsafe trait AsPyPointer {
    /// Returns the underlying FFI pointer as a borrowed pointer.
    fn as_ptr(&self) -> *mut ffi::PyObject;

    /// Whether the pointer is non-null. Handles which are known to be non-null skip the test.
    #[inline]
    fn is_nonnull(&self) -> bool {
        !self.as_ptr().is_null()
    }
}

unsafe impl<T: AsPyPointer + ?Sized> AsPyPointer for &T {
    #[inline]
    fn as_ptr(&self) -> *mut ffi::PyObject {
        (**self).as_ptr()
    }

    #[inline]
    fn is_nonnull(&self) -> bool {
        (**self).is_nonnull()
    }
}

unsafe impl AsPyPointer for *mut ffi::PyObject {
    #[inline]
    fn as_ptr(&self) -> *mut ffi::PyObject {
        *self
    }
}

/// Convert `None` into a null pointer.
unsafe impl<T: AsPyPointer> AsPyPointer for Option<T> {
    #[inline]
    fn as_ptr(&self) -> *mut ffi::PyObject {
        self.as_ref()
            .map_or_else(std::ptr::null_mut, |t| t.as_ptr())
    }

    #[inline]
    fn is_nonnull(&self) -> bool {
        self.as_ref().is_some_and(|t| t.is_nonnull())
    }
}

/// Common interface of the GIL-bound handles.
///
/// `Kind` is the marker type naming what sort of Python object the handle points at, for
/// example [`PyTuple`](crate::types::PyTuple). Methods specific to a kind live on extension
/// traits implemented for every handle of that kind.
pub trait Handle<'py>: AsPyPointer {
    /// The kind of object this handle refers to.
    type Kind;

    /// Returns the GIL token this handle is bound to.
    fn py(&self) -> Python<'py>;

    /// Returns a borrowed view of this handle.
    fn as_object(&self) -> Object<'_, Self::Kind>;

    /// Views this handle as known to be non-null.
    ///
    /// This does not set a Python error; a null handle has nothing to report it through, so
    /// the failure is a plain Rust error instead.
    #[inline]
    fn as_nonnull(&self) -> Result<NonNullObject<'_, Self::Kind>, NullViewError> {
        let obj = self.as_object();
        if obj.ptr.is_null() {
            Err(NullViewError)
        } else {
            Ok(NonNullObject(obj))
        }
    }

    /// Returns the reference count of the object, or `-1` for a null handle.
    #[inline]
    fn refcnt(&self) -> isize {
        let ptr = self.as_ptr();
        if ptr.is_null() {
            -1
        } else {
            unsafe { ffi::Py_REFCNT(ptr) }
        }
    }
}

/// Marker for kinds whose handles dereference to the [`PyAny`] handle of the same shape, giving
/// them the generic object protocol of [`AnyMethods`].
///
/// # Safety
///
/// Only for zero-sized kind markers other than `PyAny` itself.
pub unsafe trait DerefToPyAny {}

/// A borrowed handle to a Python object.
///
/// Copying an `Object` copies the pointer; it never touches the reference count. The pointer may
/// be null, in which case every fallible operation reports the "failed null check" error.
#[repr(transparent)]
pub struct Object<'py, K = PyAny> {
    ptr: *mut ffi::PyObject,
    _marker: PhantomData<(Python<'py>, K)>,
}

impl<K> Clone for Object<'_, K> {
    #[inline]
    fn clone(&self) -> Self {
        *self
    }
}

impl<K> Copy for Object<'_, K> {}

impl<'py, K> Object<'py, K> {
    /// Creates a null handle.
    #[inline]
    pub fn null(_py: Python<'py>) -> Self {
        Object {
            ptr: ptr::null_mut(),
            _marker: PhantomData,
        }
    }

    /// Wraps a borrowed pointer without any check.
    ///
    /// # Safety
    ///
    /// `ptr` must be null or point to a live Python object of kind `K` which stays alive for `'py`.
    #[inline]
    pub unsafe fn from_borrowed_ptr(_py: Python<'py>, ptr: *mut ffi::PyObject) -> Self {
        Object {
            ptr,
            _marker: PhantomData,
        }
    }

    /// Whether this handle is null.
    #[inline]
    pub fn is_null(&self) -> bool {
        self.ptr.is_null()
    }

    /// Forgets the kind of this handle.
    #[inline]
    pub fn as_any(&self) -> Object<'py, PyAny> {
        Object {
            ptr: self.ptr,
            _marker: PhantomData,
        }
    }

    /// Narrows this handle to kind `U`, checking the type of the object at runtime.
    ///
    /// A null handle passes through unchanged. If the object is not of kind `U`, a `TypeError`
    /// is returned.
    pub fn cast<U: PyTypeCheck>(self) -> PyResult<Object<'py, U>> {
        if self.ptr.is_null() || U::type_check(self.as_any()) {
            Ok(unsafe { self.cast_unchecked() })
        } else {
            Err(cast_error(self.as_any(), U::NAME))
        }
    }

    /// Narrows this handle to kind `U` without checking.
    ///
    /// # Safety
    ///
    /// The object must be null or of kind `U`.
    #[inline]
    pub unsafe fn cast_unchecked<U>(self) -> Object<'py, U> {
        Object {
            ptr: self.ptr,
            _marker: PhantomData,
        }
    }
}

unsafe impl<K> AsPyPointer for Object<'_, K> {
    #[inline]
    fn as_ptr(&self) -> *mut ffi::PyObject {
        self.ptr
    }
}

impl<'py, K> Handle<'py> for Object<'py, K> {
    type Kind = K;

    #[inline]
    fn py(&self) -> Python<'py> {
        unsafe { Python::assume_gil_acquired() }
    }

    #[inline]
    fn as_object(&self) -> Object<'_, K> {
        *self
    }
}

impl<'py, K: DerefToPyAny> Deref for Object<'py, K> {
    type Target = Object<'py, PyAny>;

    #[inline]
    fn deref(&self) -> &Object<'py, PyAny> {
        // Safety: all `Object`s share the same layout.
        unsafe { &*(self as *const Self).cast::<Object<'py, PyAny>>() }
    }
}

/// A borrowed handle which is known to be non-null.
///
/// Only obtainable from [`Handle::as_nonnull`]. Operations on it skip the null check made by the
/// other handles.
#[repr(transparent)]
pub struct NonNullObject<'py, K = PyAny>(Object<'py, K>);

impl<K> Clone for NonNullObject<'_, K> {
    #[inline]
    fn clone(&self) -> Self {
        *self
    }
}

impl<K> Copy for NonNullObject<'_, K> {}

impl<'py, K> NonNullObject<'py, K> {
    /// Forgets the kind of this handle.
    #[inline]
    pub fn as_any(&self) -> NonNullObject<'py, PyAny> {
        NonNullObject(self.0.as_any())
    }

    /// Returns the underlying pointer as a `NonNull`.
    #[inline]
    pub fn as_non_null(&self) -> NonNull<ffi::PyObject> {
        // Safety: the pointer was checked when this view was created.
        unsafe { NonNull::new_unchecked(self.0.ptr) }
    }
}

unsafe impl<K> AsPyPointer for NonNullObject<'_, K> {
    #[inline]
    fn as_ptr(&self) -> *mut ffi::PyObject {
        self.0.ptr
    }

    #[inline]
    fn is_nonnull(&self) -> bool {
        true
    }
}

impl<'py, K> Handle<'py> for NonNullObject<'py, K> {
    type Kind = K;

    #[inline]
    fn py(&self) -> Python<'py> {
        unsafe { Python::assume_gil_acquired() }
    }

    #[inline]
    fn as_object(&self) -> Object<'_, K> {
        self.0
    }

    #[inline]
    fn as_nonnull(&self) -> Result<NonNullObject<'_, K>, NullViewError> {
        Ok(*self)
    }
}

impl<'py, K: DerefToPyAny> Deref for NonNullObject<'py, K> {
    type Target = NonNullObject<'py, PyAny>;

    #[inline]
    fn deref(&self) -> &NonNullObject<'py, PyAny> {
        // Safety: all `NonNullObject`s share the same layout.
        unsafe { &*(self as *const Self).cast::<NonNullObject<'py, PyAny>>() }
    }
}

/// An owning handle: holds exactly one reference unit to a Python object, which it releases
/// when dropped.
///
/// Cloning retains a new unit. An `Owned` may also be empty (null), which it becomes after its
/// reference was handed off with [`take_ptr`](Owned::take_ptr) or moved out with
/// [`take`](Owned::take); dropping an empty handle releases nothing.
#[repr(transparent)]
pub struct Owned<'py, K = PyAny>(Object<'py, K>);

impl<'py, K> Owned<'py, K> {
    /// Takes ownership of `ptr`, which must already carry one reference unit for the caller.
    ///
    /// A null pointer yields an empty handle.
    ///
    /// # Safety
    ///
    /// `ptr` must be null or an owned reference to a Python object of kind `K`.
    #[inline]
    pub unsafe fn from_owned_ptr(py: Python<'py>, ptr: *mut ffi::PyObject) -> Self {
        Owned(unsafe { Object::from_borrowed_ptr(py, ptr) })
    }

    /// Like [`from_owned_ptr`](Owned::from_owned_ptr), but a null pointer fetches the error the
    /// interpreter has set.
    ///
    /// # Safety
    ///
    /// As [`from_owned_ptr`](Owned::from_owned_ptr).
    #[inline]
    pub unsafe fn from_owned_ptr_or_err(py: Python<'py>, ptr: *mut ffi::PyObject) -> PyResult<Self> {
        if ptr.is_null() {
            Err(PyErr::fetch(py))
        } else {
            Ok(unsafe { Self::from_owned_ptr(py, ptr) })
        }
    }

    /// Retains a new reference unit to the object behind `handle`.
    #[inline]
    pub fn retain<H>(handle: &H) -> Self
    where
        H: Handle<'py, Kind = K> + ?Sized,
    {
        let ptr = handle.as_ptr();
        unsafe {
            ffi::Py_XINCREF(ptr);
            Self::from_owned_ptr(handle.py(), ptr)
        }
    }

    /// Creates an empty handle.
    #[inline]
    pub fn empty(py: Python<'py>) -> Self {
        Owned(Object::null(py))
    }

    /// Whether this handle is empty.
    #[inline]
    pub fn is_null(&self) -> bool {
        self.0.is_null()
    }

    /// Hands the reference unit off to the caller without releasing it.
    #[inline]
    pub fn into_ptr(self) -> *mut ffi::PyObject {
        ManuallyDrop::new(self).0.ptr
    }

    /// Hands the reference unit off to the caller, leaving this handle empty.
    #[inline]
    pub fn take_ptr(&mut self) -> *mut ffi::PyObject {
        std::mem::replace(&mut self.0.ptr, ptr::null_mut())
    }

    /// Moves the reference unit into a new handle, leaving this one empty.
    #[inline]
    pub fn take(&mut self) -> Self {
        let py = self.py();
        std::mem::replace(self, Owned::empty(py))
    }

    /// Forgets the kind of this handle.
    #[inline]
    pub fn into_any(self) -> Owned<'py, PyAny> {
        unsafe { self.cast_into_unchecked() }
    }

    /// Narrows this handle to kind `U`, checking the type of the object at runtime.
    ///
    /// An empty handle passes through unchanged. On a type mismatch the reference is released
    /// and a `TypeError` returned.
    pub fn cast_into<U: PyTypeCheck>(self) -> PyResult<Owned<'py, U>> {
        self.0.cast::<U>()?;
        Ok(unsafe { self.cast_into_unchecked() })
    }

    /// Narrows this handle to kind `U` without checking.
    ///
    /// # Safety
    ///
    /// The object must be null or of kind `U`.
    #[inline]
    pub unsafe fn cast_into_unchecked<U>(self) -> Owned<'py, U> {
        let py = self.py();
        unsafe { Owned::from_owned_ptr(py, self.into_ptr()) }
    }

    /// Detaches the reference from the GIL lifetime so it can be stored or sent to other threads.
    ///
    /// Returns `None` for an empty handle.
    #[inline]
    pub fn unbind(self) -> Option<Py<K>> {
        NonNull::new(self.into_ptr()).map(|ptr| Py(ptr, PhantomData))
    }
}

impl<K> Drop for Owned<'_, K> {
    #[inline]
    fn drop(&mut self) {
        unsafe { ffi::Py_XDECREF(self.0.ptr) }
    }
}

impl<K> Clone for Owned<'_, K> {
    #[inline]
    fn clone(&self) -> Self {
        unsafe { ffi::Py_XINCREF(self.0.ptr) };
        Owned(self.0)
    }
}

unsafe impl<K> AsPyPointer for Owned<'_, K> {
    #[inline]
    fn as_ptr(&self) -> *mut ffi::PyObject {
        self.0.ptr
    }
}

impl<'py, K> Handle<'py> for Owned<'py, K> {
    type Kind = K;

    #[inline]
    fn py(&self) -> Python<'py> {
        unsafe { Python::assume_gil_acquired() }
    }

    #[inline]
    fn as_object(&self) -> Object<'_, K> {
        self.0
    }
}

impl<'py, K: DerefToPyAny> Deref for Owned<'py, K> {
    type Target = Owned<'py, PyAny>;

    #[inline]
    fn deref(&self) -> &Owned<'py, PyAny> {
        // Safety: all `Owned`s share the same layout.
        unsafe { &*(self as *const Self).cast::<Owned<'py, PyAny>>() }
    }
}

/// A reference to a Python object which is independent of the GIL lifetime.
///
/// `Py` can be stored in structs and sent between threads. Dropping it while the GIL is not held
/// defers the release until the GIL is next acquired.
#[repr(transparent)]
pub struct Py<K = PyAny>(NonNull<ffi::PyObject>, PhantomData<K>);

// The object is only ever touched with the GIL held, and dropping without it goes through the
// deferred release pool.
unsafe impl<K> Send for Py<K> {}
unsafe impl<K> Sync for Py<K> {}

impl<K> Py<K> {
    /// Borrows the object for the lifetime of the GIL token.
    #[inline]
    pub fn bind<'py>(&'py self, py: Python<'py>) -> Object<'py, K> {
        unsafe { Object::from_borrowed_ptr(py, self.0.as_ptr()) }
    }

    /// Retains a new owning handle to the object.
    #[inline]
    pub fn bind_owned<'py>(&self, py: Python<'py>) -> Owned<'py, K> {
        let object = unsafe { Object::<'py, K>::from_borrowed_ptr(py, self.0.as_ptr()) };
        Owned::retain(&object)
    }

    /// Converts this reference back into a GIL-bound owning handle.
    #[inline]
    pub fn into_bound(self, py: Python<'_>) -> Owned<'_, K> {
        let ptr = ManuallyDrop::new(self).0.as_ptr();
        unsafe { Owned::from_owned_ptr(py, ptr) }
    }

    /// Makes a clone of `self` by increasing the reference count.
    #[inline]
    pub fn clone_ref(&self, _py: Python<'_>) -> Py<K> {
        unsafe { ffi::Py_INCREF(self.0.as_ptr()) };
        Py(self.0, PhantomData)
    }

    /// Takes ownership of a non-null owned pointer.
    ///
    /// # Safety
    ///
    /// `ptr` must be an owned reference to an object of kind `K`.
    #[inline]
    pub(crate) unsafe fn from_non_null(ptr: NonNull<ffi::PyObject>) -> Self {
        Py(ptr, PhantomData)
    }
}

unsafe impl<K> AsPyPointer for Py<K> {
    #[inline]
    fn as_ptr(&self) -> *mut ffi::PyObject {
        self.0.as_ptr()
    }

    #[inline]
    fn is_nonnull(&self) -> bool {
        true
    }
}

impl<K> Drop for Py<K> {
    fn drop(&mut self) {
        unsafe { gil::register_decref(self.0) };
    }
}

impl<K> fmt::Debug for Py<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Py").field(&self.0.as_ptr()).finish()
    }
}

/// Error returned by [`Handle::as_nonnull`] when the handle is null.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NullViewError;

impl fmt::Display for NullViewError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("cannot view a null object as non-null")
    }
}

impl std::error::Error for NullViewError {}

pub(crate) fn cast_error(from: Object<'_, PyAny>, to: &str) -> PyErr {
    let type_name = from
        .get_type()
        .and_then(|ty| ty.name())
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|_| String::from("<unknown>"));
    crate::exceptions::PyTypeError::new_err(format!(
        "'{}' object cannot be converted to '{}'",
        type_name, to
    ))
}

fn python_format(
    any: Object<'_, PyAny>,
    format_result: PyResult<Owned<'_, crate::types::PyString>>,
    f: &mut fmt::Formatter<'_>,
) -> fmt::Result {
    match format_result {
        Ok(s) => return f.write_str(&s.to_string_lossy()),
        Err(err) => err.write_unraisable(any.py(), Some(any)),
    }

    match any.get_type().and_then(|ty| ty.name()) {
        Ok(name) => write!(f, "<unprintable {} object>", name.to_string_lossy()),
        Err(_err) => f.write_str("<unprintable object>"),
    }
}

impl<K> fmt::Display for Object<'_, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.ptr.is_null() {
            return f.write_str("<NULL>");
        }
        let any = self.as_any();
        python_format(any, any.str(), f)
    }
}

impl<K> fmt::Debug for Object<'_, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.ptr.is_null() {
            return f.write_str("<NULL>");
        }
        let any = self.as_any();
        python_format(any, any.repr(), f)
    }
}

impl<K> fmt::Display for NonNullObject<'_, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl<K> fmt::Debug for NonNullObject<'_, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl<K> fmt::Display for Owned<'_, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl<K> fmt::Debug for Owned<'_, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}
