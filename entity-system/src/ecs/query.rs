// Copyright 2025 John Brosnihan
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//! Component-type queries
//!
//! A query is a tuple of component types. Its mask is the union of the
//! members' bits; an entity matches when its own mask is a superset.

use crate::ecs::{ComponentMask, ComponentOf, ComponentSet};

/// A set of component types, all of which must be present
pub trait Query<S: ComponentSet> {
    /// Combined mask of every member type
    fn mask() -> ComponentMask;
}

impl<S: ComponentSet> Query<S> for () {
    fn mask() -> ComponentMask {
        ComponentMask::empty()
    }
}

macro_rules! recursive_macro_call_on_tuple {
    ($m: ident, $ty: ident) => {
        $m!{$ty}
    };
    ($m: ident, $ty: ident, $($tt: ident),*) => {
        $m!{$ty, $($tt),*}
        recursive_macro_call_on_tuple!{$m, $($tt),*}
    };
}

macro_rules! impl_query {
    ($($ty:ident),+) => {
        impl<S: ComponentSet, $($ty: ComponentOf<S>),+> Query<S> for ($($ty,)+) {
            fn mask() -> ComponentMask {
                ComponentMask::empty()$(.with($ty::INDEX))+
            }
        }
    };
}

recursive_macro_call_on_tuple!(impl_query, A, B, C, D, E, F, G, H);
