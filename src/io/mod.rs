mod buf;
mod buf_ext;
mod buf_mut;

pub(crate) use buf::Buf;
pub(crate) use buf_ext::BufExt;
pub(crate) use buf_mut::BufMut;
