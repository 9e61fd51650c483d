// Copyright (c) 2026 shiftwatch contributors
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

pub mod settings;
